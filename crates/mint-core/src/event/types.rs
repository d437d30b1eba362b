//! Tipos de evento del flujo y estructura `FlowEvent`.
//!
//! Rol en el motor:
//! - Cada transición del runtime emite un evento a un `EventStore`
//!   append-only con clave por flow_id.
//! - El log es el mecanismo de persistencia: reproducirlo reconstruye la
//!   instancia (request incluido) tras recargar el proceso, sin volver a
//!   pedir firmas por pasos ya exitosos.
//! - El enum `FlowEventKind` es el contrato observable y estable del motor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use mint_domain::{Address, TxHash};

use crate::errors::FlowError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Primer evento de un `flow_id`: fija el flujo, la cuenta, el request
    /// normalizado y la resolución inicial de pasos.
    FlowInitialized {
        flow: String,
        account: Address,
        request: Value,
        request_hash: String,
        definition_hash: String,
        step_ids: Vec<String>,
    },
    /// Re-resolución de pasos al reanudar: la lista puede ser más corta si
    /// las precondiciones ya se satisficieron en cadena.
    FlowResumed {
        definition_hash: String,
        step_ids: Vec<String>,
    },
    /// El paso entró a `commit` (posiblemente esperando la wallet). No
    /// implica envío.
    StepStarted { step_index: usize, step_id: String },
    /// `commit` devolvió un handle: la transacción existe en la cadena o
    /// en su mempool. A partir de aquí no hay rollback posible.
    StepSubmitted {
        step_index: usize,
        step_id: String,
        tx_hash: TxHash,
    },
    /// `verify` en vuelo: esperando confirmación y/o al indexador.
    StepConfirming {
        step_index: usize,
        step_id: String,
        tx_hash: TxHash,
    },
    /// Paso terminado correctamente.
    StepSucceeded {
        step_index: usize,
        step_id: String,
        tx_hash: TxHash,
    },
    /// Paso fallado con su error específico. El flujo no continúa
    /// (stop-on-failure); los pasos previos exitosos conservan su estado.
    StepFailed {
        step_index: usize,
        step_id: String,
        error: FlowError,
    },
    /// Confirmado en cadena pero el modelo de lectura no refleja el efecto
    /// dentro de la cota de sondeo. El paso queda en `Confirming` y el
    /// flujo en `StepNeedsRetry`: no es una falla dura.
    StepStalled {
        step_index: usize,
        step_id: String,
        tx_hash: TxHash,
    },
    /// Cierre exitoso del flujo completo.
    FlowCompleted { flow_fingerprint: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64, // asignado por el EventStore (orden de append)
    pub flow_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>, // metadato, no participa de fingerprints
}
