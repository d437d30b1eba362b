use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Monto de token en unidades base (punto fijo de 18 decimales).
///
/// Todos los tokens del protocolo usan la misma escala, así que el número
/// de decimales no viaja junto al valor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    /// Aprobación infinita (el papel de `maxUint256` en los ERC-20).
    pub const MAX: Amount = Amount(u128::MAX);

    const ONE: u128 = 1_000_000_000_000_000_000;

    /// Construye desde unidades enteras del token (`10` → `10 * 10^18`).
    pub fn from_whole(units: u64) -> Self {
        Amount(units as u128 * Self::ONE)
    }

    /// Construye desde milésimas del token (`37_500` → `37.5`).
    pub fn from_milli(milli: u64) -> Self {
        Amount(milli as u128 * (Self::ONE / 1000))
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Multiplica por una tasa expresada también en punto fijo 18
    /// (ej. `0.05e18` = 5%). Usado para estimaciones de interés anual.
    pub fn mul_rate(self, rate: Amount) -> Amount {
        Amount(self.0 / Self::ONE * rate.0 + (self.0 % Self::ONE) * rate.0 / Self::ONE)
    }

    pub fn parse_base_units(s: &str) -> Result<Self, DomainError> {
        s.parse::<u128>().map(Amount).map_err(|_| DomainError::InvalidAmount(s.to_string()))
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::ONE;
        let frac = self.0 % Self::ONE;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let frac_str = format!("{:018}", frac);
            write!(f, "{}.{}", whole, frac_str.trim_end_matches('0'))
        }
    }
}

// Se serializa como string decimal de unidades base: JSON no representa
// u128 sin pérdida.
impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::parse_base_units(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_and_milli_constructors() {
        assert_eq!(Amount::from_whole(10).base_units(), 10 * Amount::ONE);
        assert_eq!(Amount::from_milli(37_500), Amount::from_whole(37) + Amount::from_milli(500));
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Amount::from_whole(10).to_string(), "10");
        assert_eq!(Amount::from_milli(10_500).to_string(), "10.5");
    }

    #[test]
    fn mul_rate_five_percent() {
        let principal = Amount::from_whole(1000);
        let rate = Amount::from_milli(50); // 5%
        assert_eq!(principal.mul_rate(rate), Amount::from_whole(50));
    }

    #[test]
    fn serde_as_base_unit_string() {
        let amount = Amount::from_whole(1);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, back);
    }
}
