// mint-domain library entry point
pub mod address;
pub mod amount;
pub mod branch;
pub mod constants;
pub mod error;
pub mod governance;
pub mod trove;

pub use address::{Address, TxHash};
pub use amount::Amount;
pub use branch::{Branch, BranchContracts, BranchId, CollSymbol, Protocol, DEV_PROTOCOL};
pub use constants::GAS_COMPENSATION;
pub use error::DomainError;
pub use governance::{voting_power, GovernancePeriod, GovernanceState, InitiativeBribe, InitiativeStatus,
                     UserStakeState, Vote, VoteTotals};
pub use trove::{Trove, TroveId, TroveStatus};
