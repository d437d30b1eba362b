//! mint-adapters: capa de protocolo sobre el motor de flujos.
//!
//! - `calls`: constructores de `CallSpec` para los contratos del protocolo.
//! - `flows`: declaraciones de flujo concretas (abrir posición, staking,
//!   votos, bribes).
//! - `mock`: dobles en memoria de la cadena y del indexador, usados por los
//!   tests y el binario de demostración.

pub mod calls;
pub mod flows;
pub mod mock;
