use serde::{Deserialize, Serialize};

/// Estado de un paso en tiempo de ejecución.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Submitted` (commit devolvió un hash)
/// - `Submitted` -> `Confirming` (verify en vuelo)
/// - `Confirming` -> `Succeeded`
/// - `Pending` | `Confirming` -> `Failed`
///
/// Un paso `Failed` detiene el avance del flujo pero preserva el estado de
/// los pasos anteriores: los efectos on-chain no se revierten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Pendiente de ejecución (o esperando la firma en la wallet).
    Pending,
    /// La transacción fue enviada; existe un handle.
    Submitted,
    /// Esperando confirmación en cadena y/o visibilidad en el indexador.
    Confirming,
    /// Terminal: confirmado y reconciliado.
    Succeeded,
    /// Terminal para este intento.
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Succeeded | StepStatus::Failed)
    }
}
