//! Declaraciones de flujo y registros.

pub mod declaration;
pub mod registry;

pub use declaration::{FlowDeclaration, StepRegistry};
pub use registry::{ErasedDeclaration, FlowRegistry};
