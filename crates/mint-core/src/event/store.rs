use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{FlowEvent, FlowEventKind};

/// Almacenamiento de eventos append-only, con clave por flujo.
pub trait EventStore: Send {
    /// Agrega un evento a partir de su kind y devuelve el evento completo
    /// (con seq y ts asignados).
    fn append_kind(&mut self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent;
    /// Lista eventos de un flujo (orden ascendente por seq).
    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent>;
    /// Flujos con al menos un evento.
    fn flow_ids(&self) -> Vec<Uuid>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<FlowEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, flow_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        let events = self.inner.entry(flow_id).or_default();
        let ev = FlowEvent { seq: events.len() as u64,
                             flow_id,
                             kind,
                             ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, flow_id: Uuid) -> Vec<FlowEvent> {
        self.inner.get(&flow_id).cloned().unwrap_or_default()
    }

    fn flow_ids(&self) -> Vec<Uuid> {
        self.inner.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_sequential_seq() {
        let mut store = InMemoryEventStore::new();
        let flow_id = Uuid::new_v4();
        let first = store.append_kind(flow_id,
                                      FlowEventKind::StepStarted { step_index: 0,
                                                                   step_id: "approveLst".into() });
        let second = store.append_kind(flow_id,
                                       FlowEventKind::StepStarted { step_index: 1,
                                                                    step_id: "openTrove".into() });
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
        assert_eq!(store.list(flow_id).len(), 2);
        assert_eq!(store.flow_ids(), vec![flow_id]);
    }
}
