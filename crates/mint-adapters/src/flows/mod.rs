//! Declaraciones de flujo del protocolo.
//!
//! Cada flujo es una entrada de registro: esquema de request, pasos que
//! puede usar y resolvedor `get_steps` contra estado vivo. Agregar un flujo
//! es agregar un módulo acá, nunca tocar el motor.

mod shared;

pub mod allocate_votes;
pub mod claim_bribes;
pub mod open_borrow_position;
pub mod stake_deposit;

pub use allocate_votes::{AllocateVotes, AllocateVotesRequest, VoteAllocation};
pub use claim_bribes::{ClaimBribes, ClaimBribesRequest};
pub use open_borrow_position::{OpenBorrowPosition, OpenBorrowPositionRequest};
pub use stake_deposit::{StakeDeposit, StakeDepositRequest};
