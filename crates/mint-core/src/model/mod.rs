//! Modelo del motor: esquema/validación de requests y contexto de ejecución.

pub mod context;
pub mod schema;

pub use context::{ApproveMethod, FlowContext, FlowEnv};
pub use schema::{validators, RequestSchema};
