//! Constantes del motor de flujos.
//!
//! `ENGINE_VERSION` participa en el cálculo del fingerprint de definición
//! que se persiste en `FlowInitialized`: un cambio incompatible del motor
//! invalida de forma determinista los fingerprints aunque la definición y
//! el request no cambien.

/// Versión lógica del motor. Mantener estable mientras no haya cambios
/// incompatibles en el formato de eventos o en la semántica de ejecución.
pub const ENGINE_VERSION: &str = "1.0";

/// Intervalo por defecto del sondeo al modelo de lectura.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Cota por defecto de intentos de sondeo. `0` en la variable de entorno
/// significa sin cota.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 120;
