// error.rs
use thiserror::Error;

/// Error del dominio de protocolo: parseo de direcciones, montos y
/// referencias a ramas/troves inexistentes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("dirección inválida: {0}")]
    InvalidAddress(String),

    #[error("hash de transacción inválido: {0}")]
    InvalidTxHash(String),

    #[error("monto inválido: {0}")]
    InvalidAmount(String),

    #[error("rama desconocida: {0}")]
    UnknownBranch(u32),

    #[error("trove id inválido: {0}")]
    InvalidTroveId(String),
}
