//! Dobles en memoria de la cadena y del indexador.

mod chain;
mod indexer;

pub use chain::MockChain;
pub use indexer::MockIndexer;
