use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{Address, DomainError};

/// Despliegue compartido por tests y demos, evaluado una sola vez.
pub static DEV_PROTOCOL: Lazy<Protocol> = Lazy::new(Protocol::dev_fixture);

/// Identificador de rama de colateral (un conjunto de contratos por tipo de
/// colateral).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(pub u32);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Símbolo del token de colateral de una rama.
///
/// `Wankr` es el caso especial: el colateral y el depósito de gas son el
/// mismo token, de modo que la aprobación de colateral debe cubrir ambos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollSymbol {
    Wankr,
    StAnkr,
    RAnkr,
}

impl CollSymbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollSymbol::Wankr => "WANKR",
            CollSymbol::StAnkr => "stANKR",
            CollSymbol::RAnkr => "rANKR",
        }
    }
}

impl fmt::Display for CollSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direcciones de los contratos propios de una rama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchContracts {
    pub borrower_operations: Address,
    pub coll_token: Address,
    pub trove_manager: Address,
}

/// Rama de colateral: símbolo + contratos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub symbol: CollSymbol,
    pub contracts: BranchContracts,
}

/// Tabla inmutable de ramas y contratos compartidos del protocolo.
/// Se construye una vez por despliegue y se comparte entre flujos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub branches: Vec<Branch>,
    /// Token wANKR compartido (depósito de gas en ramas LST).
    pub weth: Address,
    /// Contrato de gobernanza (staking, votos, iniciativas).
    pub governance: Address,
    /// Token de gobernanza.
    pub gov_token: Address,
}

impl Protocol {
    pub fn branch(&self, id: BranchId) -> Result<&Branch, DomainError> {
        self.branches
            .iter()
            .find(|b| b.id == id)
            .ok_or(DomainError::UnknownBranch(id.0))
    }

    /// Despliegue determinista para pruebas y demos: una rama WANKR y dos
    /// ramas LST con direcciones `Address::dev`.
    pub fn dev_fixture() -> Protocol {
        let branch = |id: u32, symbol: CollSymbol, base: u8| Branch {
            id: BranchId(id),
            symbol,
            contracts: BranchContracts { borrower_operations: Address::dev(base),
                                         coll_token: Address::dev(base + 1),
                                         trove_manager: Address::dev(base + 2) },
        };
        Protocol { branches: vec![branch(0, CollSymbol::Wankr, 0x10),
                                  branch(1, CollSymbol::StAnkr, 0x20),
                                  branch(2, CollSymbol::RAnkr, 0x30)],
                   weth: Address::dev(0x11), // misma dirección que el colateral WANKR
                   governance: Address::dev(0x40),
                   gov_token: Address::dev(0x41) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_lookup() {
        let protocol = Protocol::dev_fixture();
        assert_eq!(protocol.branch(BranchId(1)).unwrap().symbol, CollSymbol::StAnkr);
        assert_eq!(protocol.branch(BranchId(9)).unwrap_err(), DomainError::UnknownBranch(9));
    }

    #[test]
    fn wankr_branch_shares_weth_token() {
        let protocol = Protocol::dev_fixture();
        let wankr = protocol.branch(BranchId(0)).unwrap();
        assert_eq!(wankr.contracts.coll_token, protocol.weth);
    }
}
