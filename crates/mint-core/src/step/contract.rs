//! Contrato declarativo de un paso.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mint_domain::TxHash;

use crate::errors::FlowError;
use crate::model::FlowContext;

/// Descriptor de presentación del estado de un paso. El motor no renderiza
/// nada: la capa de UI decide cómo mostrar cada variante.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusView {
    /// Transacción de la acción principal.
    #[default]
    Transaction,
    /// Paso de aprobación previa a la acción principal.
    ApprovalOnly,
}

/// Descripción de una acción on-chain atómica: cómo nombrarse dado el
/// contexto, cómo presentar su estado, cómo enviarse y cómo verificar que
/// aterrizó.
///
/// Implementaciones no guardan estado de ejecución: todo lo mutable viaja
/// por el `FlowContext` o queda en el `StepState` del runtime.
#[async_trait]
pub trait StepContract<R: Send + Sync>: Send + Sync {
    /// Nombre legible dado el contexto (p. ej. "Approve stANKR").
    fn name(&self, ctx: &FlowContext<R>) -> String;

    /// Descriptor de presentación del estado.
    fn status_view(&self) -> StatusView {
        StatusView::Transaction
    }

    /// Envía la transacción del paso y devuelve su handle. Punto de
    /// suspensión: puede requerir confirmación humana (cancelable, surge
    /// como `UserRejected`).
    async fn commit(&self, ctx: &mut FlowContext<R>) -> Result<TxHash, FlowError>;

    /// Bloquea hasta que la transacción esté confirmada y, si aplica, hasta
    /// que el modelo de lectura refleje el efecto.
    async fn verify(&self, ctx: &mut FlowContext<R>, hash: TxHash) -> Result<(), FlowError>;
}
