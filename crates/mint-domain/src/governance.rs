//! Tipos de gobernanza: épocas, iniciativas, asignación de votos y bribes.
//!
//! Derivados de las vistas on-chain del contrato `Governance`: el estado
//! global de época, el estado por iniciativa y el estado de staking por
//! usuario.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount};

/// Estado de una iniciativa según el contrato de gobernanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeStatus {
    Nonexistent,
    WarmUp,
    Skip,
    Claimable,
    Claimed,
    Unregisterable,
    Disabled,
}

impl InitiativeStatus {
    /// Mapea el discriminante numérico on-chain. Valores fuera de rango se
    /// tratan como inexistentes.
    pub fn from_number(status: u8) -> InitiativeStatus {
        match status {
            1 => InitiativeStatus::WarmUp,
            2 => InitiativeStatus::Skip,
            3 => InitiativeStatus::Claimable,
            4 => InitiativeStatus::Claimed,
            5 => InitiativeStatus::Unregisterable,
            6 => InitiativeStatus::Disabled,
            _ => InitiativeStatus::Nonexistent,
        }
    }
}

/// Fase de la época en curso: votación abierta o período de corte, durante
/// el cual sólo se aceptan vetos nuevos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernancePeriod {
    Voting,
    Cutoff,
}

/// Estado global de gobernanza leído del contrato al inicio de un flujo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceState {
    pub epoch: u64,
    pub epoch_start: u64,
    pub epoch_duration: u64,
    pub voting_cutoff: u64,
    pub seconds_within_epoch: u64,
}

impl GovernanceState {
    pub fn period(&self) -> GovernancePeriod {
        if self.seconds_within_epoch > self.voting_cutoff {
            GovernancePeriod::Cutoff
        } else {
            GovernancePeriod::Voting
        }
    }

    pub fn epoch_end(&self) -> u64 {
        self.epoch_start + self.epoch_duration
    }

    pub fn cutoff_start(&self) -> u64 {
        self.epoch_start + self.voting_cutoff
    }

    pub fn seconds_left(&self) -> u64 {
        self.epoch_duration.saturating_sub(self.seconds_within_epoch)
    }
}

/// Totales de voto por iniciativa (`initiativeStates` on-chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTotals {
    pub vote_qty: Amount,
    pub vote_offset: Amount,
    pub veto_qty: Amount,
    pub veto_offset: Amount,
}

/// Estado de staking de un usuario (`userStates` on-chain) con los totales
/// derivados que usa el cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStakeState {
    pub unallocated_qty: Amount,
    pub unallocated_offset: Amount,
    pub allocated_qty: Amount,
    pub allocated_offset: Amount,
}

impl UserStakeState {
    pub fn staked_qty(&self) -> Amount {
        self.allocated_qty.saturating_add(self.unallocated_qty)
    }

    pub fn staked_offset(&self) -> Amount {
        self.allocated_offset.saturating_add(self.unallocated_offset)
    }
}

/// votingPower(t) = qty * t - offset
pub fn voting_power(staked_qty: Amount, offset: Amount, timestamp_secs: u64) -> u128 {
    staked_qty.base_units()
              .saturating_mul(timestamp_secs as u128)
              .saturating_sub(offset.base_units())
}

/// Sentido de un voto sobre una iniciativa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

/// Bribe publicado por una iniciativa para una época.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeBribe {
    pub bold_amount: Amount,
    pub token_amount: Amount,
    pub token_address: Address,
    pub token_symbol: String,
}
