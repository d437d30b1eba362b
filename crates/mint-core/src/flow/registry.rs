//! Registro de declaraciones a nivel de proceso.
//!
//! Permite validar un request crudo por nombre de flujo antes de construir
//! el runtime tipado (contrato `validate(flowName, rawRequest)`).

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::FlowError;
use crate::flow::FlowDeclaration;

/// Vista borrada de una declaración: lo necesario para validar por nombre.
pub trait ErasedDeclaration: Send + Sync {
    fn flow_name(&self) -> &'static str;

    /// Valida el request crudo y devuelve su forma normalizada (la
    /// serialización del request tipado), lista para persistir.
    fn validate(&self, raw: &Value) -> Result<Value, FlowError>;
}

impl<D: FlowDeclaration> ErasedDeclaration for D {
    fn flow_name(&self) -> &'static str {
        self.name()
    }

    fn validate(&self, raw: &Value) -> Result<Value, FlowError> {
        let request = self.parse_request(raw)?;
        serde_json::to_value(&request).map_err(|e| FlowError::Internal(e.to_string()))
    }
}

/// Mapa nombre → declaración, en orden de registro.
pub struct FlowRegistry {
    flows: IndexMap<&'static str, Arc<dyn ErasedDeclaration>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        FlowRegistry { flows: IndexMap::new() }
    }

    pub fn register<D: FlowDeclaration>(mut self, declaration: D) -> Self {
        self.flows.insert(declaration.name(), Arc::new(declaration));
        self
    }

    /// `validate(flowName, rawRequest)`: aplica el esquema de la
    /// declaración y devuelve el request normalizado, o todas las fallas.
    pub fn validate(&self, flow_name: &str, raw: &Value) -> Result<Value, FlowError> {
        let declaration = self.flows
                              .get(flow_name)
                              .ok_or_else(|| FlowError::UnknownFlow(flow_name.to_string()))?;
        declaration.validate(raw)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.flows.keys().copied()
    }

    pub fn contains(&self, flow_name: &str) -> bool {
        self.flows.contains_key(flow_name)
    }
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
