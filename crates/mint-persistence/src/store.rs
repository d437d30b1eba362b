//! `EventStore` durable: un log JSON-lines por flujo.
//!
//! Cada flujo persiste bajo `<state_dir>/<flow_id>.jsonl`, una línea por
//! evento en orden de append. `open` rehidrata todos los logs existentes a
//! memoria; las escrituras posteriores son append puro sobre el archivo del
//! flujo. Un problema de I/O al persistir no detiene el flujo en vuelo: el
//! evento queda en memoria y se reporta con `log::warn!`: perder
//! durabilidad es preferible a perder una transacción ya enviada.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use uuid::Uuid;

use mint_core::{EventStore, FlowEvent, FlowEventKind};

use crate::error::PersistenceError;

pub struct FileEventStore {
    dir: PathBuf,
    cache: HashMap<Uuid, Vec<FlowEvent>>,
}

impl FileEventStore {
    /// Abre (o crea) el directorio de estado y rehidrata los logs
    /// existentes. Líneas corruptas se saltan con una advertencia: un log
    /// dañado no debe impedir reanudar los demás flujos.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| PersistenceError::Io { path: dir.clone(), source })?;

        let mut cache: HashMap<Uuid, Vec<FlowEvent>> = HashMap::new();
        let entries = fs::read_dir(&dir).map_err(|source| PersistenceError::Io { path: dir.clone(), source })?;
        for entry in entries {
            let entry = entry.map_err(|source| PersistenceError::Io { path: dir.clone(), source })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let flow_id = match path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse::<Uuid>().ok()) {
                Some(id) => id,
                None => continue, // archivo ajeno al store
            };
            cache.insert(flow_id, Self::load_log(&path)?);
        }

        Ok(FileEventStore { dir, cache })
    }

    pub fn state_dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, flow_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.jsonl", flow_id))
    }

    fn load_log(path: &Path) -> Result<Vec<FlowEvent>, PersistenceError> {
        let file = fs::File::open(path).map_err(|source| PersistenceError::Io { path: path.to_path_buf(), source })?;
        let mut events = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| PersistenceError::Io { path: path.to_path_buf(), source })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FlowEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!("skipping corrupt event in {} (line {}): {}", path.display(), number + 1, e),
            }
        }
        Ok(events)
    }

    fn persist(&self, flow_id: Uuid, event: &FlowEvent) {
        let path = self.path_for(flow_id);
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("event for flow {} not serializable: {}", flow_id, e);
                return;
            }
        };
        let result = OpenOptions::new().create(true)
                                       .append(true)
                                       .open(&path)
                                       .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = result {
            warn!("event for flow {} kept in memory only, append to {} failed: {}",
                  flow_id,
                  path.display(),
                  e);
        }
    }
}

impl EventStore for FileEventStore {
    fn append_kind(&mut self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        let events = self.cache.entry(flow_id).or_default();
        let event = FlowEvent { seq: events.len() as u64,
                                flow_id,
                                kind,
                                ts: Utc::now() };
        events.push(event.clone());
        self.persist(flow_id, &event);
        event
    }

    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.cache.get(&flow_id).cloned().unwrap_or_default()
    }

    fn flow_ids(&self) -> Vec<Uuid> {
        self.cache.keys().copied().collect()
    }
}
