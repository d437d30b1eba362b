use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BranchId, DomainError};

/// Identificador de trove dentro de una rama. En cadena es un uint256
/// derivado de (owner, ownerIndex); aquí lo representamos como u128 con
/// forma canónica hexadecimal, igual que la clave del servicio indexador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TroveId(pub u128);

impl TroveId {
    /// Clave con la que el indexador publica el trove: `branch:0x…`.
    pub fn indexed_key(&self, branch: BranchId) -> String {
        format!("{}:{}", branch, self)
    }
}

impl fmt::Display for TroveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for TroveId {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").ok_or_else(|| DomainError::InvalidTroveId(s.to_string()))?;
        u128::from_str_radix(hex, 16).map(TroveId)
                                     .map_err(|_| DomainError::InvalidTroveId(s.to_string()))
    }
}

impl Serialize for TroveId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TroveId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TroveStatus {
    Active,
    Closed,
    Liquidated,
    Redeemed,
}

/// Posición de préstamo tal como la publica el modelo de lectura.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trove {
    pub id: TroveId,
    pub branch_id: BranchId,
    pub borrower: Address,
    pub deposit: Amount,
    pub borrowed: Amount,
    pub annual_interest_rate: Amount,
    pub interest_batch_manager: Option<Address>,
    pub status: TroveStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trove_id_hex_roundtrip() {
        let id = TroveId(0xdeadbeef);
        assert_eq!(id.to_string(), "0xdeadbeef");
        assert_eq!("0xdeadbeef".parse::<TroveId>().unwrap(), id);
    }

    #[test]
    fn indexed_key_includes_branch() {
        assert_eq!(TroveId(0xff).indexed_key(BranchId(2)), "2:0xff");
    }
}
