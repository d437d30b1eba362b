//! Colaboradores externos del motor, consumidos por interfaz estrecha.
//!
//! El motor no posee ningún protocolo de red: envía transacciones y lee
//! estado a través de `ChainClient`, espera confirmaciones con
//! `ReceiptWatcher` y consulta el modelo de lectura (eventualmente
//! consistente) con `IndexerClient`. La codificación ABI queda fuera de
//! alcance: una llamada se describe como datos (`CallSpec`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mint_domain::{Address, TxHash};

use crate::errors::FlowError;

/// Descripción de una llamada a contrato: dirección + función + argumentos
/// JSON. La codificación concreta es asunto del cliente de cadena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSpec {
    pub address: Address,
    pub function: String,
    pub args: Vec<Value>,
}

impl CallSpec {
    pub fn new(address: Address, function: impl Into<String>, args: Vec<Value>) -> Self {
        CallSpec { address,
                   function: function.into(),
                   args }
    }
}

/// Log emitido por un contrato dentro de un receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub address: Address,
    pub event: String,
    pub data: Value,
}

/// Receipt de una transacción confirmada. `wait_for_receipt` sólo devuelve
/// receipts de transacciones exitosas; un revert se reporta como error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub logs: Vec<ReceiptLog>,
}

impl Receipt {
    /// Primer log con el nombre de evento dado, si existe.
    pub fn find_log(&self, event: &str) -> Option<&ReceiptLog> {
        self.logs.iter().find(|l| l.event == event)
    }
}

/// Cliente de wallet/cadena.
///
/// `write_contract` es un punto de suspensión: puede requerir confirmación
/// humana en la wallet (espera no acotada). Si el usuario cierra el prompt
/// la implementación debe devolver `FlowError::UserRejected`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Lectura de estado de contrato. Siempre contra estado vivo: el motor
    /// depende de esto para no resolver pasos con allowances obsoletas.
    async fn read_contract(&self, spec: &CallSpec) -> Result<Value, FlowError>;

    /// Envía una transacción firmada por `account` y devuelve su hash.
    async fn write_contract(&self, account: Address, spec: &CallSpec) -> Result<TxHash, FlowError>;
}

/// Observador de confirmaciones.
#[async_trait]
pub trait ReceiptWatcher: Send + Sync {
    /// Bloquea hasta que la transacción se confirme. Falla con
    /// `ConfirmationTimeout` o `TransactionReverted`.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, FlowError>;
}

/// Servicio de indexación (modelo de lectura eventualmente consistente).
#[async_trait]
pub trait IndexerClient: Send + Sync {
    /// `Ok(None)` significa "todavía no visible"; el bucle de sondeo es
    /// responsabilidad del motor, no del servicio.
    async fn entity_by_id(&self, kind: &str, id: &str) -> Result<Option<Value>, FlowError>;
}
