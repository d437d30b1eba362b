//! Configuración del motor.
//! Lee variables de entorno una sola vez y expone una estructura inmutable
//! (`CONFIG`). Los binarios cargan `.env` con dotenvy antes del primer
//! acceso.

use std::env;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::constants::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS};

/// Política de sondeo al modelo de lectura (poll-until-visible).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pausa entre consultas consecutivas.
    pub interval: Duration,
    /// Cota de intentos. `None` = sin cota: puede colgar si el indexador
    /// no está disponible.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        CONFIG.poll
    }
}

impl PollPolicy {
    /// Política agresiva para tests: sin pausas reales apreciables.
    pub fn fast(max_attempts: Option<u32>) -> Self {
        PollPolicy { interval: Duration::from_millis(1),
                     max_attempts }
    }
}

/// Configuración global del motor (extensible para más secciones).
pub struct EngineConfig {
    pub poll: PollPolicy,
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<EngineConfig> = Lazy::new(|| {
    let interval_ms = env::var("MINTFLOW_POLL_INTERVAL_MS").ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    let max_attempts = match env::var("MINTFLOW_POLL_MAX_ATTEMPTS").ok()
        .and_then(|v| v.parse::<u32>().ok())
    {
        Some(0) => None, // 0 = sin cota
        Some(n) => Some(n),
        None => Some(DEFAULT_POLL_MAX_ATTEMPTS),
    };
    EngineConfig { poll: PollPolicy { interval: Duration::from_millis(interval_ms),
                                      max_attempts } }
});
