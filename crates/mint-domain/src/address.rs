use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

fn decode_hex(s: &str, out: &mut [u8]) -> Result<(), ()> {
    let s = s.strip_prefix("0x").ok_or(())?;
    // el input viene crudo del request del usuario: un byte multi-byte
    // UTF-8 debe rechazarse, no cortar el string en mitad de un carácter
    if !s.is_ascii() || s.len() != out.len() * 2 {
        return Err(());
    }
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| ())?;
    }
    Ok(())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// Dirección de cuenta o contrato (20 bytes, forma canónica `0x…` en minúsculas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Dirección determinista para fixtures y mocks (último byte = tag).
    pub fn dev(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        decode_hex(s, &mut bytes).map_err(|_| DomainError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode_hex(&self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash de transacción (32 bytes) devuelto por el cliente de cadena al
/// enviar una transacción. Opaco para el motor: sólo se persiste y se pasa
/// al verificador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Hash determinista para fixtures (último byte = tag).
    pub fn dev(tag: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = tag;
        TxHash(bytes)
    }
}

impl FromStr for TxHash {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        decode_hex(s, &mut bytes).map_err(|_| DomainError::InvalidTxHash(s.to_string()))?;
        Ok(TxHash(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode_hex(&self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrip_hex() {
        let addr: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(addr, Address::dev(0xff));
        assert_eq!(addr.to_string(), "0x00000000000000000000000000000000000000ff");
    }

    #[test]
    fn address_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("no-prefix".parse::<Address>().is_err());
        assert!("0xzz000000000000000000000000000000000000zz".parse::<Address>().is_err());
    }

    #[test]
    fn non_ascii_input_errors_instead_of_panicking() {
        // 42 bytes en total, con un carácter multi-byte que caería justo
        // en el corte del primer par hexadecimal
        let addr = format!("0xa\u{00e9}{}", "0".repeat(37));
        assert_eq!(addr.len(), 42);
        assert!(addr.parse::<Address>().is_err());

        let hash = format!("0xa\u{00e9}{}", "0".repeat(61));
        assert!(hash.parse::<TxHash>().is_err());
    }

    #[test]
    fn tx_hash_serde_roundtrip() {
        let hash = TxHash::dev(7);
        let json = serde_json::to_string(&hash).unwrap();
        let back: TxHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);
    }
}
