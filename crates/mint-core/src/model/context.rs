//! Contexto de ejecución de un flujo.
//!
//! `FlowContext` es el entorno mutable que atraviesa cada paso: el request
//! validado, la cuenta activa, los colaboradores externos y los valores
//! auxiliares que pasos anteriores calcularon (p. ej. el trove id extraído
//! del receipt del paso 1). Es propiedad exclusiva de un runtime: dos
//! flujos concurrentes jamás comparten contexto, sólo los handles `Arc` de
//! los clientes de sólo lectura.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use mint_domain::{Address, TxHash};

use crate::config::PollPolicy;
use crate::errors::FlowError;
use crate::ports::{CallSpec, ChainClient, IndexerClient, Receipt, ReceiptWatcher};
use crate::runtime::poll_until_visible;

/// Preferencia de aprobación ERC-20 del usuario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApproveMethod {
    /// Aprueba el monto exacto que consumirá la acción.
    #[default]
    Exact,
    /// Aprobación infinita (`Amount::MAX`), evita futuros pasos de approve.
    Infinite,
}

/// Colaboradores compartidos + política de sondeo. Barato de clonar:
/// sólo contiene `Arc`s y valores `Copy`.
#[derive(Clone)]
pub struct FlowEnv {
    pub chain: Arc<dyn ChainClient>,
    pub receipts: Arc<dyn ReceiptWatcher>,
    pub indexer: Arc<dyn IndexerClient>,
    pub poll: PollPolicy,
    pub approve_method: ApproveMethod,
}

impl FlowEnv {
    pub fn new(chain: Arc<dyn ChainClient>,
               receipts: Arc<dyn ReceiptWatcher>,
               indexer: Arc<dyn IndexerClient>)
               -> Self {
        FlowEnv { chain,
                  receipts,
                  indexer,
                  poll: PollPolicy::default(),
                  approve_method: ApproveMethod::default() }
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_approve_method(mut self, method: ApproveMethod) -> Self {
        self.approve_method = method;
        self
    }
}

/// Entorno de ejecución entregado a `commit`/`verify` de cada paso.
pub struct FlowContext<R> {
    pub flow_id: Uuid,
    pub account: Address,
    pub request: R,
    pub env: FlowEnv,
    vars: HashMap<String, Value>,
}

impl<R: Send + Sync> FlowContext<R> {
    pub fn new(flow_id: Uuid, account: Address, request: R, env: FlowEnv) -> Self {
        FlowContext { flow_id,
                      account,
                      request,
                      env,
                      vars: HashMap::new() }
    }

    pub fn approve_method(&self) -> ApproveMethod {
        self.env.approve_method
    }

    /// Lectura de contrato contra estado vivo de la cadena.
    pub async fn read_contract(&self, spec: &CallSpec) -> Result<Value, FlowError> {
        self.env.chain.read_contract(spec).await
    }

    /// Envía una transacción firmada por la cuenta activa. Punto de
    /// suspensión: puede esperar confirmación humana en la wallet.
    pub async fn write_contract(&self, spec: &CallSpec) -> Result<TxHash, FlowError> {
        self.env.chain.write_contract(self.account, spec).await
    }

    pub async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, FlowError> {
        self.env.receipts.wait_for_receipt(hash).await
    }

    /// Sondea el modelo de lectura hasta que la entidad sea visible, según
    /// la política configurada.
    pub async fn poll_entity(&self, kind: &str, id: &str) -> Result<Value, FlowError> {
        let indexer = Arc::clone(&self.env.indexer);
        poll_until_visible(&self.env.poll, || {
            let indexer = Arc::clone(&indexer);
            let kind = kind.to_string();
            let id = id.to_string();
            async move { indexer.entity_by_id(&kind, &id).await }
        }).await
    }

    /// Publica un valor auxiliar para pasos posteriores.
    pub fn set_var(&mut self, key: &str, value: Value) {
        self.vars.insert(key.to_string(), value);
    }

    /// Lee un valor auxiliar calculado por un paso anterior.
    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }
}
