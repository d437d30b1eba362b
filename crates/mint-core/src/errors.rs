//! Errores del motor de flujos.
//!
//! La taxonomía distingue fallas previas a cualquier efecto en cadena
//! (validación, resolución de pasos) de fallas posteriores al envío de una
//! transacción, que nunca provocan rollback: el trabajo del motor es dejar
//! el avance reanudable, no deshacerlo.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problema de un campo individual del request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Falla de validación del request: acumula todos los campos problemáticos
/// para que el llamador los reporte de una vez.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub flow: String,
    pub issues: Vec<FieldIssue>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid request for flow '{}':", self.flow)?;
        for issue in &self.issues {
            write!(f, " [{}: {}]", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum FlowError {
    /// Request mal formado. Fatal, se reporta antes de cualquier transacción.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No se pudo calcular la lista de pasos (lectura de cadena fallida u
    /// otra condición transitoria). Reintentable.
    #[error("step resolution failed: {0}")]
    StepResolution(String),
    #[error("unknown flow: {0}")]
    UnknownFlow(String),
    #[error("step not present in registry: {0}")]
    UnknownStep(String),
    /// El usuario declinó la firma en la wallet. Recuperable: puede
    /// reintentar el mismo paso.
    #[error("user rejected the wallet prompt")]
    UserRejected,
    /// La cadena rechazó la transacción. Fatal para este intento.
    #[error("transaction reverted: {0}")]
    TransactionReverted(String),
    /// El watcher no vio el receipt dentro de sus condiciones.
    #[error("timed out waiting for receipt: {0}")]
    ConfirmationTimeout(String),
    /// Confirmado en cadena pero el modelo de lectura no lo refleja dentro
    /// de la cota de sondeo. No es falla dura: el efecto on-chain existe.
    #[error("confirmed on-chain but not yet visible in the read model")]
    VerificationStalled,
    #[error("chain transport error: {0}")]
    ChainTransport(String),
    #[error("flow already completed")]
    FlowCompleted,
    #[error("internal: {0}")]
    Internal(String),
}

impl FlowError {
    /// Fallas que ocurren antes de que exista un handle de transacción y
    /// que se resuelven corrigiendo el input y reiniciando.
    pub fn is_pre_commit(&self) -> bool {
        matches!(self,
                 FlowError::Validation(_)
                 | FlowError::StepResolution(_)
                 | FlowError::UnknownFlow(_)
                 | FlowError::UnknownStep(_))
    }
}
