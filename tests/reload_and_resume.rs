//! De punta a punta con persistencia en disco: un flujo que queda varado
//! esperando al indexador sobrevive a un reinicio de proceso. El log
//! JSON-lines reconstruye la instancia y la reanudación retoma en la
//! verificación, sin volver a enviar la transacción ya minada.

use std::sync::Arc;

use serde_json::{json, Value};

use mint_adapters::flows::OpenBorrowPosition;
use mint_adapters::mock::{MockChain, MockIndexer};
use mint_core::runtime::load;
use mint_core::{EventStore, FlowEnv, FlowError, FlowRuntime, FlowStatus, PollPolicy, StepStatus};
use mint_domain::{Address, Amount, Protocol};
use mint_persistence::FileEventStore;

const ACCOUNT: Address = Address([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xaa]);

fn open_request() -> Value {
    json!({
        "branchId": 0,
        "owner": ACCOUNT,
        "ownerIndex": 0,
        "collAmount": Amount::from_whole(10),
        "boldAmount": Amount::from_whole(1000),
        "annualInterestRate": Amount::from_milli(50),
        "maxUpfrontFee": Amount::from_whole(100),
        "interestRateDelegate": null,
    })
}

#[tokio::test]
async fn stalled_flow_resumes_from_disk_without_resubmitting() {
    let dir = tempfile::tempdir().unwrap();
    let protocol = Arc::new(Protocol::dev_fixture());
    let indexer = Arc::new(MockIndexer::new());
    let chain = Arc::new(MockChain::new((*protocol).clone(), Arc::clone(&indexer)));
    let env = FlowEnv::new(chain.clone(), chain.clone(), indexer).with_poll(PollPolicy::fast(Some(3)));

    // el indexador tarda más consultas que la cota de sondeo
    chain.set_indexer_lag(5);

    let store = FileEventStore::open(dir.path()).unwrap();
    let mut rt = FlowRuntime::new(OpenBorrowPosition::new(Arc::clone(&protocol)),
                                  env.clone(),
                                  store,
                                  ACCOUNT,
                                  &open_request()).unwrap();
    let flow_id = rt.flow_id();

    let err = rt.start().await.unwrap_err();
    assert_eq!(err, FlowError::VerificationStalled);
    assert_eq!(rt.status(), FlowStatus::StepNeedsRetry);
    let submitted = rt.steps().last().unwrap().tx_hash.expect("openTrove was submitted");
    drop(rt); // el proceso muere; sólo queda el log en disco

    // el replay del log reconstruye la instancia varada
    let store = FileEventStore::open(dir.path()).unwrap();
    let instance = load(flow_id, &store.list(flow_id)).unwrap();
    assert_eq!(instance.status, FlowStatus::StepNeedsRetry);
    let (index, step) = instance.current_step().unwrap();
    assert_eq!(step.id, "openTrove");
    assert_eq!(step.status, StepStatus::Confirming);
    assert_eq!(step.tx_hash, Some(submitted));
    assert!(index > 0, "the approval stayed succeeded");

    // reanudar retoma en verify y termina cuando el indexador alcanza
    let mut rt = FlowRuntime::resume(OpenBorrowPosition::new(Arc::clone(&protocol)),
                                     env,
                                     store,
                                     flow_id).unwrap();
    let status = rt.start().await.unwrap();
    assert_eq!(status, FlowStatus::Succeeded);

    // la transacción minada no se re-envió
    let opens = chain.mined_writes()
                     .iter()
                     .filter(|(_, spec)| spec.function == "openTrove")
                     .count();
    assert_eq!(opens, 1);
    assert_eq!(rt.steps().last().unwrap().tx_hash, Some(submitted));
}
