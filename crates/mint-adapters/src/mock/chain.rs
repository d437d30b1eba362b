//! Cadena en memoria para pruebas y demos.
//!
//! Interpreta los `CallSpec` de `calls.rs` contra estado compartido
//! (`DashMap`): allowances ERC-20, troves, staking de gobernanza. Los
//! efectos de un write se reflejan en el `MockIndexer` asociado con el
//! retardo configurado, igual que un indexador real consumiendo bloques.
//!
//! Guionable: se puede encolar un rechazo de wallet o un revert para el
//! próximo write, sin tocar el estado.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};

use mint_core::{CallSpec, ChainClient, FlowError, Receipt, ReceiptLog, ReceiptWatcher};
use mint_domain::{Address, Amount, GovernanceState, Protocol, Trove, TroveId, TroveStatus};

use super::MockIndexer;

/// Clave de allowance: (token, owner, spender).
type AllowanceKey = (Address, Address, Address);

pub struct MockChain {
    protocol: Protocol,
    indexer: Arc<MockIndexer>,
    allowances: DashMap<AllowanceKey, Amount>,
    stakes: DashMap<Address, Amount>,
    receipts: DashMap<[u8; 32], Receipt>,
    reverted: DashMap<[u8; 32], String>,
    governance_state: Mutex<GovernanceState>,
    writes: Mutex<Vec<(Address, CallSpec)>>,
    reject_next: AtomicU32,
    revert_next: AtomicU32,
    indexer_lag: AtomicU32,
    next_hash: AtomicU8,
    next_trove: AtomicU32,
}

impl MockChain {
    pub fn new(protocol: Protocol, indexer: Arc<MockIndexer>) -> Self {
        MockChain { protocol,
                    indexer,
                    allowances: DashMap::new(),
                    stakes: DashMap::new(),
                    receipts: DashMap::new(),
                    reverted: DashMap::new(),
                    governance_state: Mutex::new(GovernanceState { epoch: 1,
                                                                   epoch_start: 0,
                                                                   epoch_duration: 7 * 24 * 3600,
                                                                   voting_cutoff: 6 * 24 * 3600,
                                                                   seconds_within_epoch: 0 }),
                    writes: Mutex::new(Vec::new()),
                    reject_next: AtomicU32::new(0),
                    revert_next: AtomicU32::new(0),
                    indexer_lag: AtomicU32::new(0),
                    next_hash: AtomicU8::new(0),
                    next_trove: AtomicU32::new(0) }
    }

    // --- guiones de prueba -------------------------------------------

    /// El próximo write se rechaza en la wallet (no llega a la cadena).
    pub fn reject_next_write(&self) {
        self.reject_next.fetch_add(1, Ordering::SeqCst);
    }

    /// El próximo write se mina pero revierte (sin efectos de estado).
    pub fn revert_next_write(&self) {
        self.revert_next.fetch_add(1, Ordering::SeqCst);
    }

    /// Retardo de visibilidad con el que los efectos llegan al indexador.
    pub fn set_indexer_lag(&self, queries: u32) {
        self.indexer_lag.store(queries, Ordering::SeqCst);
    }

    pub fn set_governance_state(&self, state: GovernanceState) {
        *self.governance_state.lock().unwrap() = state;
    }

    // --- estado observable -------------------------------------------

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: Amount) {
        self.allowances.insert((token, owner, spender), amount);
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(token, owner, spender))
            .map(|a| *a)
            .unwrap_or(Amount::ZERO)
    }

    pub fn stake_of(&self, account: Address) -> Amount {
        self.stakes.get(&account).map(|a| *a).unwrap_or(Amount::ZERO)
    }

    /// Writes mineados (rechazos y reverts excluidos), para asserts.
    pub fn mined_writes(&self) -> Vec<(Address, CallSpec)> {
        self.writes.lock().unwrap().clone()
    }

    // --- internos ------------------------------------------------------

    fn arg<T: serde::de::DeserializeOwned>(spec: &CallSpec, index: usize) -> Result<T, FlowError> {
        let value = spec.args
                        .get(index)
                        .ok_or_else(|| FlowError::ChainTransport(format!("{}: missing arg {}", spec.function, index)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| FlowError::ChainTransport(format!("{}: bad arg {}: {}", spec.function, index, e)))
    }

    fn obj_field<T: serde::de::DeserializeOwned>(spec: &CallSpec, field: &str) -> Result<T, FlowError> {
        let value = spec.args
                        .first()
                        .and_then(|v| v.get(field))
                        .ok_or_else(|| FlowError::ChainTransport(format!("{}: missing field {}", spec.function, field)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| FlowError::ChainTransport(format!("{}: bad field {}: {}", spec.function, field, e)))
    }

    fn consume_allowance(&self, token: Address, owner: Address, spender: Address, amount: Amount) {
        if let Some(mut entry) = self.allowances.get_mut(&(token, owner, spender)) {
            // la aprobación infinita no se descuenta, como en los ERC-20
            // que cortocircuitan maxUint256
            if *entry != Amount::MAX {
                *entry = entry.saturating_sub(amount);
            }
        }
    }

    fn open_trove(&self, account: Address, spec: &CallSpec, hash: [u8; 32]) -> Result<Receipt, FlowError> {
        let branch = self.protocol
                         .branches
                         .iter()
                         .find(|b| b.contracts.borrower_operations == spec.address)
                         .ok_or_else(|| FlowError::ChainTransport(format!("no branch at {}", spec.address)))?;

        let batch = spec.function == "openTroveAndJoinInterestBatchManager";
        let (owner, coll, bold, rate, delegate): (Address, Amount, Amount, Amount, Option<Address>) = if batch {
            (Self::obj_field(spec, "owner")?,
             Self::obj_field(spec, "collAmount")?,
             Self::obj_field(spec, "boldAmount")?,
             Amount::ZERO,
             Some(Self::obj_field(spec, "interestBatchManager")?))
        } else {
            (Self::arg(spec, 0)?, Self::arg(spec, 2)?, Self::arg(spec, 3)?, Self::arg(spec, 4)?, None)
        };

        self.consume_allowance(branch.contracts.coll_token, account, spec.address, coll);
        if branch.contracts.coll_token != self.protocol.weth {
            self.consume_allowance(self.protocol.weth, account, spec.address, mint_domain::GAS_COMPENSATION);
        }

        let trove_id = TroveId(self.next_trove.fetch_add(1, Ordering::SeqCst) as u128 + 0xa1);
        let trove = Trove { id: trove_id,
                            branch_id: branch.id,
                            borrower: owner,
                            deposit: coll,
                            borrowed: bold,
                            annual_interest_rate: rate,
                            interest_batch_manager: delegate,
                            status: TroveStatus::Active };
        self.indexer.publish_after("trove",
                                   &trove_id.indexed_key(branch.id),
                                   serde_json::to_value(&trove).map_err(|e| FlowError::Internal(e.to_string()))?,
                                   self.indexer_lag.load(Ordering::SeqCst));

        Ok(Receipt { tx_hash: mint_domain::TxHash(hash),
                     block_number: 1,
                     logs: vec![ReceiptLog { address: branch.contracts.trove_manager,
                                             event: "TroveOperation".to_string(),
                                             data: json!({ "_troveId": trove_id.to_string() }) }] })
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn read_contract(&self, spec: &CallSpec) -> Result<Value, FlowError> {
        match spec.function.as_str() {
            "allowance" => {
                let owner: Address = Self::arg(spec, 0)?;
                let spender: Address = Self::arg(spec, 1)?;
                Ok(json!(self.allowance_of(spec.address, owner, spender)))
            }
            "epochState" => {
                let state = *self.governance_state.lock().unwrap();
                serde_json::to_value(state).map_err(|e| FlowError::Internal(e.to_string()))
            }
            other => Err(FlowError::ChainTransport(format!("unhandled read: {}", other))),
        }
    }

    async fn write_contract(&self, account: Address, spec: &CallSpec) -> Result<mint_domain::TxHash, FlowError> {
        if self.reject_next.load(Ordering::SeqCst) > 0 {
            self.reject_next.fetch_sub(1, Ordering::SeqCst);
            return Err(FlowError::UserRejected);
        }

        let n = self.next_hash.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = mint_domain::TxHash::dev(n);

        if self.revert_next.load(Ordering::SeqCst) > 0 {
            self.revert_next.fetch_sub(1, Ordering::SeqCst);
            // la transacción se mina pero sin efectos
            self.reverted.insert(hash.0, format!("{} reverted", spec.function));
            return Ok(hash);
        }

        let receipt = match spec.function.as_str() {
            "approve" => {
                let spender: Address = Self::arg(spec, 0)?;
                let amount: Amount = Self::arg(spec, 1)?;
                self.allowances.insert((spec.address, account, spender), amount);
                Receipt { tx_hash: hash,
                          block_number: 1,
                          logs: vec![] }
            }
            "openTrove" | "openTroveAndJoinInterestBatchManager" => self.open_trove(account, spec, hash.0)?,
            "depositGov" => {
                let amount: Amount = Self::arg(spec, 0)?;
                self.consume_allowance(self.protocol.gov_token, account, spec.address, amount);
                let mut stake = self.stakes.entry(account).or_insert(Amount::ZERO);
                *stake = stake.saturating_add(amount);
                Receipt { tx_hash: hash,
                          block_number: 1,
                          logs: vec![] }
            }
            "allocateVotes" | "claimBribes" => Receipt { tx_hash: hash,
                                                         block_number: 1,
                                                         logs: vec![] },
            other => return Err(FlowError::ChainTransport(format!("unhandled write: {}", other))),
        };

        self.receipts.insert(hash.0, receipt);
        self.writes.lock().unwrap().push((account, spec.clone()));
        Ok(hash)
    }
}

#[async_trait]
impl ReceiptWatcher for MockChain {
    async fn wait_for_receipt(&self, hash: mint_domain::TxHash) -> Result<Receipt, FlowError> {
        if let Some(reason) = self.reverted.get(&hash.0) {
            return Err(FlowError::TransactionReverted(reason.clone()));
        }
        self.receipts
            .get(&hash.0)
            .map(|r| r.clone())
            .ok_or_else(|| FlowError::ConfirmationTimeout(hash.to_string()))
    }
}
