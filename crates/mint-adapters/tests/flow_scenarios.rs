//! Escenarios de punta a punta de las declaraciones de flujo contra la
//! cadena y el indexador en memoria: adaptación de la lista de pasos a las
//! allowances vigentes, rechazo en la wallet, reverts, verificación varada
//! y reglas de época de gobernanza.

use std::sync::Arc;

use serde_json::{json, Value};

use mint_adapters::flows::{AllocateVotes, ClaimBribes, OpenBorrowPosition, StakeDeposit};
use mint_adapters::mock::{MockChain, MockIndexer};
use mint_core::{ApproveMethod, FlowDeclaration, FlowEnv, FlowError, FlowRuntime, FlowStatus, InMemoryEventStore,
                PollPolicy, StepStatus};
use mint_domain::{Address, Amount, BranchId, GovernanceState, Protocol, GAS_COMPENSATION};

const ACCOUNT: Address = Address([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xaa]);

struct Fixture {
    protocol: Arc<Protocol>,
    chain: Arc<MockChain>,
    indexer: Arc<MockIndexer>,
    env: FlowEnv,
}

fn fixture() -> Fixture {
    let protocol = Arc::new(Protocol::dev_fixture());
    let indexer = Arc::new(MockIndexer::new());
    let chain = Arc::new(MockChain::new((*protocol).clone(), Arc::clone(&indexer)));
    let env = FlowEnv::new(chain.clone(), chain.clone(), indexer.clone()).with_poll(PollPolicy::fast(Some(20)));
    Fixture { protocol,
              chain,
              indexer,
              env }
}

fn open_request(branch: u32, coll: Amount, bold: Amount) -> Value {
    json!({
        "branchId": branch,
        "owner": ACCOUNT,
        "ownerIndex": 0,
        "collAmount": coll,
        "boldAmount": bold,
        "annualInterestRate": Amount::from_milli(50),
        "maxUpfrontFee": Amount::from_whole(100),
        "interestRateDelegate": null,
    })
}

fn runtime<D: FlowDeclaration>(declaration: D, env: FlowEnv, raw: &Value) -> FlowRuntime<D, InMemoryEventStore> {
    FlowRuntime::new(declaration, env, InMemoryEventStore::new(), ACCOUNT, raw).expect("valid request")
}

fn step_ids<D: FlowDeclaration, S: mint_core::EventStore>(rt: &FlowRuntime<D, S>) -> Vec<String> {
    rt.steps().iter().map(|s| s.id.clone()).collect()
}

// ---------------------------------------------------------------------
// openBorrowPosition
// ---------------------------------------------------------------------

/// Escenario A: sin allowance previa, la rama WANKR necesita un único
/// approve (colateral + depósito de gas en el mismo token) antes del
/// openTrove.
#[tokio::test]
async fn open_position_without_allowance_approves_then_opens() {
    let f = fixture();
    let coll = Amount::from_whole(10);
    let raw = open_request(0, coll, Amount::from_whole(1000));

    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), f.env.clone(), &raw);
    let status = rt.start().await.expect("flow runs to the end");

    assert_eq!(status, FlowStatus::Succeeded);
    assert_eq!(step_ids(&rt), vec!["approveLst", "openTrove"]);

    let writes = f.chain.mined_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].1.function, "approve");
    // en WANKR la aprobación cubre colateral + depósito de gas
    assert_eq!(writes[0].1.args[1], json!(coll.saturating_add(GAS_COMPENSATION)));
    assert_eq!(writes[1].1.function, "openTrove");

    // el trove quedó visible en el modelo de lectura y su id circuló por
    // el contexto hacia los observadores
    let trove_id = rt.context().var("troveId").and_then(|v| v.as_str().map(str::to_string)).expect("troveId var");
    assert!(f.indexer.contains("trove", &format!("0:{}", trove_id)));
}

/// Escenario B: con allowance suficiente el approve desaparece de la lista.
#[tokio::test]
async fn open_position_with_allowance_skips_the_approval() {
    let f = fixture();
    let coll = Amount::from_whole(10);
    let branch = f.protocol.branch(BranchId(0)).unwrap();
    f.chain.set_allowance(branch.contracts.coll_token,
                          ACCOUNT,
                          branch.contracts.borrower_operations,
                          coll.saturating_add(GAS_COMPENSATION));

    let raw = open_request(0, coll, Amount::from_whole(1000));
    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), f.env.clone(), &raw);
    let status = rt.start().await.expect("flow runs to the end");

    assert_eq!(status, FlowStatus::Succeeded);
    assert_eq!(step_ids(&rt), vec!["openTrove"]);
    assert_eq!(f.chain.mined_writes().len(), 1);
}

/// En ramas LST el depósito de gas se paga en wANKR: sin ninguna allowance
/// aparecen los dos approves, en orden de declaración.
#[tokio::test]
async fn lst_branch_adds_the_weth_approval() {
    let f = fixture();
    let raw = open_request(1, Amount::from_whole(5), Amount::from_whole(500));

    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), f.env.clone(), &raw);
    rt.start().await.expect("flow runs to the end");

    assert_eq!(step_ids(&rt), vec!["approveLst", "approveWeth", "openTrove"]);
    let writes = f.chain.mined_writes();
    // el approve de wANKR cubre exactamente el depósito de gas
    assert_eq!(writes[1].1.args[1], json!(GAS_COMPENSATION));
}

/// Escenario C: el trove se confirma en cadena pero el indexador no lo
/// refleja dentro de la cota: el paso queda en Confirming y el flujo señala
/// "reintentar más tarde", nunca Failed.
#[tokio::test]
async fn invisible_trove_stalls_the_flow_instead_of_failing() {
    let f = fixture();
    f.chain.set_indexer_lag(1_000);
    let env = f.env.clone().with_poll(PollPolicy::fast(Some(3)));

    let raw = open_request(0, Amount::from_whole(10), Amount::from_whole(1000));
    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), env, &raw);
    let err = rt.start().await.unwrap_err();

    assert_eq!(err, FlowError::VerificationStalled);
    assert_eq!(rt.status(), FlowStatus::StepNeedsRetry);
    let open = rt.steps().last().unwrap();
    assert_eq!(open.status, StepStatus::Confirming);
    // el handle existe: reanudar jamás re-enviaría la transacción
    assert!(open.tx_hash.is_some());
}

/// Escenario D: rechazo en la wallet durante el approve. El paso falla con
/// `UserRejected`, el flujo se detiene, y reintentar re-resuelve la lista y
/// vuelve a intentar el approve primero.
#[tokio::test]
async fn wallet_rejection_fails_and_the_retry_reattempts_the_approval() {
    let f = fixture();
    f.chain.reject_next_write();

    let raw = open_request(0, Amount::from_whole(10), Amount::from_whole(1000));
    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), f.env.clone(), &raw);

    let err = rt.start().await.unwrap_err();
    assert_eq!(err, FlowError::UserRejected);
    assert_eq!(rt.status(), FlowStatus::Failed);
    assert_eq!(rt.steps()[0].status, StepStatus::Failed);
    assert_eq!(rt.steps()[0].error, Some(FlowError::UserRejected));
    assert!(f.chain.mined_writes().is_empty());

    let status = rt.start().await.expect("retry succeeds");
    assert_eq!(status, FlowStatus::Succeeded);
    let writes = f.chain.mined_writes();
    assert_eq!(writes[0].1.function, "approve");
    assert_eq!(writes[1].1.function, "openTrove");
}

/// Una transacción revertida está muerta en cadena: el reintento descarta
/// su hash y vuelve a hacer commit del mismo paso.
#[tokio::test]
async fn reverted_transaction_recommits_on_retry() {
    let f = fixture();
    let coll = Amount::from_whole(10);
    let branch = f.protocol.branch(BranchId(0)).unwrap();
    f.chain.set_allowance(branch.contracts.coll_token,
                          ACCOUNT,
                          branch.contracts.borrower_operations,
                          Amount::MAX);
    f.chain.revert_next_write();

    let raw = open_request(0, coll, Amount::from_whole(1000));
    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), f.env.clone(), &raw);

    let err = rt.start().await.unwrap_err();
    assert!(matches!(err, FlowError::TransactionReverted(_)));
    let first_hash = rt.steps()[0].tx_hash;

    let status = rt.start().await.expect("retry succeeds");
    assert_eq!(status, FlowStatus::Succeeded);
    assert_ne!(rt.steps()[0].tx_hash, first_hash);
}

/// La preferencia de aprobación infinita escribe `Amount::MAX` y la
/// allowance sobrevive al consumo del openTrove.
#[tokio::test]
async fn infinite_approval_writes_max_and_is_not_consumed() {
    let f = fixture();
    let env = f.env.clone().with_approve_method(ApproveMethod::Infinite);

    let raw = open_request(0, Amount::from_whole(10), Amount::from_whole(1000));
    let mut rt = runtime(OpenBorrowPosition::new(Arc::clone(&f.protocol)), env, &raw);
    rt.start().await.expect("flow runs to the end");

    let branch = f.protocol.branch(BranchId(0)).unwrap();
    assert_eq!(f.chain.allowance_of(branch.contracts.coll_token, ACCOUNT, branch.contracts.borrower_operations),
               Amount::MAX);
}

// ---------------------------------------------------------------------
// stakeDeposit
// ---------------------------------------------------------------------

#[tokio::test]
async fn stake_deposit_approves_only_when_the_allowance_is_short() {
    let f = fixture();
    let amount = Amount::from_whole(50);

    let mut rt = runtime(StakeDeposit::new(Arc::clone(&f.protocol)),
                         f.env.clone(),
                         &json!({ "amount": amount }));
    rt.start().await.expect("flow runs to the end");

    assert_eq!(step_ids(&rt), vec!["approveGov", "depositGov"]);
    assert_eq!(f.chain.stake_of(ACCOUNT), amount);

    // con allowance remanente el approve desaparece
    f.chain.set_allowance(f.protocol.gov_token, ACCOUNT, f.protocol.governance, Amount::MAX);
    let mut rt = runtime(StakeDeposit::new(Arc::clone(&f.protocol)),
                         f.env.clone(),
                         &json!({ "amount": amount }));
    rt.start().await.expect("flow runs to the end");
    assert_eq!(step_ids(&rt), vec!["depositGov"]);
    assert_eq!(f.chain.stake_of(ACCOUNT), amount.saturating_add(amount));
}

// ---------------------------------------------------------------------
// allocateVotes / claimBribes
// ---------------------------------------------------------------------

fn cutoff_state() -> GovernanceState {
    GovernanceState { epoch: 5,
                      epoch_start: 0,
                      epoch_duration: 7 * 24 * 3600,
                      voting_cutoff: 6 * 24 * 3600,
                      seconds_within_epoch: 6 * 24 * 3600 + 1 }
}

#[tokio::test]
async fn upvotes_are_rejected_during_the_cutoff_period() {
    let f = fixture();
    f.chain.set_governance_state(cutoff_state());

    let upvote = json!({ "allocations": [
        { "initiative": Address::dev(0x77), "vote": "up", "qty": Amount::from_whole(1) },
    ]});
    let mut rt = runtime(AllocateVotes::new(Arc::clone(&f.protocol)), f.env.clone(), &upvote);
    match rt.start().await {
        Err(FlowError::StepResolution(msg)) => assert!(msg.contains("cutoff")),
        other => panic!("expected a resolution failure, got {:?}", other),
    }
    assert!(f.chain.mined_writes().is_empty());

    // los vetos siguen permitidos durante el corte
    let veto = json!({ "allocations": [
        { "initiative": Address::dev(0x77), "vote": "down", "qty": Amount::from_whole(1) },
    ]});
    let mut rt = runtime(AllocateVotes::new(Arc::clone(&f.protocol)), f.env.clone(), &veto);
    assert_eq!(rt.start().await.unwrap(), FlowStatus::Succeeded);
}

#[tokio::test]
async fn bribes_are_claimable_only_for_past_epochs() {
    let f = fixture();
    f.chain.set_governance_state(cutoff_state()); // época en curso: 5

    let past = json!({ "initiative": Address::dev(0x77), "epochs": [3, 4] });
    let mut rt = runtime(ClaimBribes::new(Arc::clone(&f.protocol)), f.env.clone(), &past);
    assert_eq!(rt.start().await.unwrap(), FlowStatus::Succeeded);
    assert_eq!(f.chain.mined_writes()[0].1.function, "claimBribes");

    let current = json!({ "initiative": Address::dev(0x77), "epochs": [4, 5] });
    let mut rt = runtime(ClaimBribes::new(Arc::clone(&f.protocol)), f.env.clone(), &current);
    assert!(matches!(rt.start().await, Err(FlowError::StepResolution(_))));
}

#[tokio::test]
async fn malformed_requests_report_every_field_at_once() {
    let f = fixture();
    let raw = json!({
        "branchId": "zero",
        "owner": "0xnope",
        "ownerIndex": 0,
        "collAmount": "0",
        "boldAmount": Amount::from_whole(1000),
        "annualInterestRate": Amount::from_milli(50),
        "maxUpfrontFee": Amount::from_whole(100),
        "interestRateDelegate": null,
    });
    match FlowRuntime::new(OpenBorrowPosition::new(Arc::clone(&f.protocol)),
                           f.env.clone(),
                           InMemoryEventStore::new(),
                           ACCOUNT,
                           &raw)
    {
        Err(FlowError::Validation(err)) => {
            let fields: Vec<&str> = err.issues.iter().map(|i| i.field.as_str()).collect();
            assert_eq!(fields, vec!["branchId", "owner", "collAmount"]);
        }
        other => panic!("expected a validation error, got {:?}", other.map(|_| ())),
    }
}
