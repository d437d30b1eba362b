//! Constructores de `CallSpec` para los contratos del protocolo.
//!
//! Sin codificación ABI: los argumentos viajan como JSON y el cliente de
//! cadena decide cómo materializarlos. Centralizar los nombres de función
//! acá evita strings repetidos en flujos y mocks.

use serde_json::json;

use mint_core::CallSpec;
use mint_domain::{Address, Amount, BranchContracts};

pub fn approve(token: Address, spender: Address, amount: Amount) -> CallSpec {
    CallSpec::new(token, "approve", vec![json!(spender), json!(amount)])
}

pub fn allowance(token: Address, owner: Address, spender: Address) -> CallSpec {
    CallSpec::new(token, "allowance", vec![json!(owner), json!(spender)])
}

/// Parámetros comunes del `openTrove` plano y su variante con batch.
pub struct OpenTroveArgs {
    pub owner: Address,
    pub owner_index: u32,
    pub coll_amount: Amount,
    pub bold_amount: Amount,
    pub annual_interest_rate: Amount,
    pub max_upfront_fee: Amount,
}

pub fn open_trove(contracts: &BranchContracts, args: &OpenTroveArgs) -> CallSpec {
    CallSpec::new(contracts.borrower_operations,
                  "openTrove",
                  vec![json!(args.owner),
                       json!(args.owner_index),
                       json!(args.coll_amount),
                       json!(args.bold_amount),
                       json!(args.annual_interest_rate),
                       json!(args.max_upfront_fee),
                       json!(args.owner), // addManager
                       json!(args.owner), // removeManager
                       json!(args.owner)  /* receiver */])
}

/// Variante batch: el interés lo administra un delegado.
pub fn open_trove_and_join_batch(contracts: &BranchContracts, args: &OpenTroveArgs, delegate: Address) -> CallSpec {
    CallSpec::new(contracts.borrower_operations,
                  "openTroveAndJoinInterestBatchManager",
                  vec![json!({
                      "owner": args.owner,
                      "ownerIndex": args.owner_index,
                      "collAmount": args.coll_amount,
                      "boldAmount": args.bold_amount,
                      "interestBatchManager": delegate,
                      "maxUpfrontFee": args.max_upfront_fee,
                      "addManager": args.owner,
                      "removeManager": args.owner,
                      "receiver": args.owner,
                  })])
}

pub fn deposit_gov(governance: Address, amount: Amount) -> CallSpec {
    CallSpec::new(governance, "depositGov", vec![json!(amount)])
}

/// Asignación de votos: listas paralelas iniciativa / voto a favor / veto.
pub fn allocate_votes(governance: Address,
                      initiatives: Vec<Address>,
                      upvotes: Vec<Amount>,
                      downvotes: Vec<Amount>)
                      -> CallSpec {
    CallSpec::new(governance,
                  "allocateVotes",
                  vec![json!(initiatives), json!(upvotes), json!(downvotes)])
}

pub fn claim_bribes(governance: Address, initiative: Address, epochs: &[u64]) -> CallSpec {
    CallSpec::new(governance, "claimBribes", vec![json!(initiative), json!(epochs)])
}

/// Lectura del estado global de época del contrato de gobernanza.
pub fn epoch_state(governance: Address) -> CallSpec {
    CallSpec::new(governance, "epochState", vec![])
}
