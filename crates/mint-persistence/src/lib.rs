//! mint-persistence
//!
//! `EventStore` durable respaldado por archivos: un log JSON-lines por
//! flujo bajo un directorio de estado. Reproducir el log reconstruye la
//! instancia, de modo que un proceso reiniciado reanuda sin volver a pedir
//! firmas por pasos ya exitosos.
//!
//! Módulos:
//! - `store`: `FileEventStore`, la implementación del trait del core.
//! - `config`: carga de configuración desde variables de entorno / .env.
//! - `error`: errores de la capa de persistencia.

pub mod config;
pub mod error;
pub mod store;

pub use config::{init_dotenv, StoreConfig};
pub use error::PersistenceError;
pub use store::FileEventStore;
