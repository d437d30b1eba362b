//! Declaración de un intent de usuario completo.
//!
//! Una declaración es estática y registrada a nivel de proceso: aporta el
//! esquema del request, el registro de pasos que puede usar y un resolvedor
//! dinámico `get_steps` que decide, contra estado vivo de cadena, qué pasos
//! hacen falta. La lista de pasos es dato, no control de flujo: flujos
//! nuevos agregan entradas al registro, nunca código nuevo de motor.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::FlowError;
use crate::hashing::hash_value;
use crate::model::{FlowContext, RequestSchema};
use crate::step::StepContract;

/// Registro ordenado paso-id → contrato. El orden de inserción es la única
/// autoridad de orden: los pasos de precondición se declaran antes que los
/// pasos que dependen de ellos, y `get_steps` preserva ese orden.
pub struct StepRegistry<R> {
    steps: IndexMap<String, Arc<dyn StepContract<R>>>,
}

impl<R: Send + Sync> StepRegistry<R> {
    pub fn new() -> Self {
        StepRegistry { steps: IndexMap::new() }
    }

    pub fn register(mut self, id: &str, contract: impl StepContract<R> + 'static) -> Self {
        self.steps.insert(id.to_string(), Arc::new(contract));
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn StepContract<R>>> {
        self.steps.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<R: Send + Sync> Default for StepRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Declaración estática de un flujo.
#[async_trait]
pub trait FlowDeclaration: Send + Sync + 'static {
    /// Request validado e inmutable de este flujo.
    type Request: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Nombre identificador, estable a través de reinicios (se persiste en
    /// `FlowInitialized` y permite reanudar por nombre).
    fn name(&self) -> &'static str;

    /// Esquema campo → validador del request crudo.
    fn schema(&self) -> RequestSchema;

    /// Registro de pasos que `get_steps` puede referenciar.
    fn steps(&self) -> StepRegistry<Self::Request>;

    /// Resuelve la lista ordenada de paso-ids necesaria en este momento.
    ///
    /// Regla de diseño: un paso se incluye si y sólo si su precondición no
    /// está satisfecha ahora mismo (p. ej. un approve sólo si la allowance
    /// vigente es menor a lo que consumirá la acción principal). Debe
    /// reevaluar contra estado vivo en cada (re)inicio, nunca cachear, y
    /// sólo devolver ids presentes en el registro.
    async fn get_steps(&self, ctx: &FlowContext<Self::Request>) -> Result<Vec<String>, FlowError>;

    /// Valida y normaliza el request crudo. Aplica el esquema (acumulando
    /// todas las fallas) y luego materializa el tipo del flujo.
    fn parse_request(&self, raw: &Value) -> Result<Self::Request, FlowError> {
        self.schema().validate(self.name(), raw)?;
        serde_json::from_value(raw.clone())
            .map_err(|e| FlowError::Internal(format!("schema accepted a request the type rejects: {e}")))
    }
}

/// Fingerprint de una resolución de pasos: identifica la forma del flujo
/// (nombre + ids en orden) en los eventos persistidos.
pub fn definition_hash(flow_name: &str, step_ids: &[String]) -> String {
    hash_value(&serde_json::json!({
        "engine_version": crate::constants::ENGINE_VERSION,
        "flow": flow_name,
        "step_ids": step_ids,
    }))
}
