use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mint_domain::TxHash;

use crate::errors::FlowError;
use crate::step::StepStatus;

/// Registro por paso dentro de una instancia de flujo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub id: String,
    pub status: StepStatus,
    /// Handle de la transacción una vez enviada. Presencia de hash implica
    /// que el paso jamás vuelve a hacer `commit`: reanudar salta directo a
    /// `verify`.
    pub tx_hash: Option<TxHash>,
    pub error: Option<FlowError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: u32,
}

impl StepState {
    pub fn pending(id: impl Into<String>) -> Self {
        StepState { id: id.into(),
                    status: StepStatus::Pending,
                    tx_hash: None,
                    error: None,
                    started_at: None,
                    finished_at: None,
                    attempts: 0 }
    }

    /// Estado trasladado a una nueva resolución de pasos: se conservan el
    /// hash y el avance; una falla previa se rearma para el reintento,
    /// conservando el contador de intentos. Una transacción revertida está
    /// muerta en cadena, así que su hash se descarta y el paso vuelve a
    /// `commit`; cualquier otra falla posterior al envío retoma en `verify`.
    pub fn carried_over(mut self) -> Self {
        if self.status == StepStatus::Failed {
            if matches!(self.error, Some(FlowError::TransactionReverted(_))) {
                self.tx_hash = None;
            }
            self.status = if self.tx_hash.is_some() { StepStatus::Submitted } else { StepStatus::Pending };
            self.error = None;
            self.finished_at = None;
        }
        self
    }
}
