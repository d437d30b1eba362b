//! Pasos: contrato declarativo, estado y ciclo de vida.

pub mod contract;
pub mod state;
pub mod status;

pub use contract::{StatusView, StepContract};
pub use state::StepState;
pub use status::StepStatus;
