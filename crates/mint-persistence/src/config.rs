//! Carga de configuración del almacenamiento desde variables de entorno.
//! Convención `MINTFLOW_STATE_DIR`, con `.env` opcional vía dotenvy.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directorio bajo el cual vive un log JSON-lines por flujo.
    pub state_dir: PathBuf,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let state_dir = env::var("MINTFLOW_STATE_DIR").map(PathBuf::from)
                                                      .unwrap_or_else(|_| PathBuf::from(".mintflow/flows"));
        Self { state_dir }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
