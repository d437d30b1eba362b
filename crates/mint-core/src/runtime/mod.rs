//! Runtime de flujos: máquina de estados, replay y sondeo.

pub mod core;
pub mod instance;
pub mod poll;

pub use core::FlowRuntime;
pub use instance::{load, rebuild, FlowInstance, FlowStatus};
pub use poll::poll_until_visible;
