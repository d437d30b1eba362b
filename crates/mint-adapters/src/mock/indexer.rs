//! Indexador en memoria con retardo de visibilidad configurable.
//!
//! El servicio real consume bloques de forma asíncrona: una entidad recién
//! creada tarda en aparecer. Acá el retardo se modela en consultas: una
//! entidad publicada con lag N responde `None` a las primeras N consultas.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use mint_core::{FlowError, IndexerClient};

struct Pending {
    value: Value,
    remaining_lag: u32,
}

#[derive(Default)]
pub struct MockIndexer {
    entities: DashMap<(String, String), Pending>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publica una entidad visible de inmediato.
    pub fn publish(&self, kind: &str, id: &str, value: Value) {
        self.publish_after(kind, id, value, 0);
    }

    /// Publica una entidad que recién responde tras `lag` consultas.
    pub fn publish_after(&self, kind: &str, id: &str, value: Value, lag: u32) {
        self.entities.insert((kind.to_string(), id.to_string()),
                             Pending { value,
                                       remaining_lag: lag });
    }

    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.entities.contains_key(&(kind.to_string(), id.to_string()))
    }
}

#[async_trait]
impl IndexerClient for MockIndexer {
    async fn entity_by_id(&self, kind: &str, id: &str) -> Result<Option<Value>, FlowError> {
        let key = (kind.to_string(), id.to_string());
        match self.entities.get_mut(&key) {
            None => Ok(None),
            Some(mut pending) => {
                if pending.remaining_lag > 0 {
                    pending.remaining_lag -= 1;
                    Ok(None)
                } else {
                    Ok(Some(pending.value.clone()))
                }
            }
        }
    }
}
