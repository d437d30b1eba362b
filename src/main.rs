//! Binario de demostración: corre los flujos del protocolo contra la
//! cadena y el indexador en memoria, mostrando la adaptación de la lista
//! de pasos, el reintento tras un rechazo de wallet y la reanudación desde
//! el log persistido en disco.

use std::sync::Arc;

use serde_json::{json, Value};

use mint_adapters::flows::OpenBorrowPosition;
use mint_adapters::mock::{MockChain, MockIndexer};
use mint_core::{FlowEnv, FlowError, FlowRuntime, InMemoryEventStore, PollPolicy};
use mint_domain::{Address, Amount, BranchId, Protocol, DEV_PROTOCOL};
use mint_persistence::{FileEventStore, StoreConfig};

const ACCOUNT: Address = Address([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xaa]);

struct Demo {
    protocol: Arc<Protocol>,
    chain: Arc<MockChain>,
    env: FlowEnv,
}

fn demo_env() -> Demo {
    let protocol = Arc::new(DEV_PROTOCOL.clone());
    let indexer = Arc::new(MockIndexer::new());
    let chain = Arc::new(MockChain::new((*protocol).clone(), Arc::clone(&indexer)));
    let env = FlowEnv::new(chain.clone(), chain.clone(), indexer).with_poll(PollPolicy::fast(Some(5)));
    Demo { protocol, chain, env }
}

fn open_request(branch: u32) -> Value {
    json!({
        "branchId": branch,
        "owner": ACCOUNT,
        "ownerIndex": 0,
        "collAmount": Amount::from_whole(10),
        "boldAmount": Amount::from_whole(1000),
        "annualInterestRate": Amount::from_milli(50),
        "maxUpfrontFee": Amount::from_whole(100),
        "interestRateDelegate": null,
    })
}

fn print_steps<D: mint_core::FlowDeclaration, S: mint_core::EventStore>(rt: &FlowRuntime<D, S>) {
    for step in rt.steps() {
        println!("    {:<12} {:?}  tx={}",
                 step.id,
                 step.status,
                 step.tx_hash.map(|h| h.to_string()).unwrap_or_else(|| "-".into()));
    }
}

/// Lista de pasos adaptativa: sin allowance el flujo aprueba y abre; con la
/// allowance ya otorgada el approve desaparece de la lista.
async fn demo_adaptive_steps() -> Result<(), FlowError> {
    println!("== demo: lista de pasos adaptativa ==");
    let demo = demo_env();

    let mut rt = FlowRuntime::new(OpenBorrowPosition::new(Arc::clone(&demo.protocol)),
                                  demo.env.clone(),
                                  InMemoryEventStore::new(),
                                  ACCOUNT,
                                  &open_request(0))?;
    let status = rt.start().await?;
    println!("  primera posición: {:?} (eventos: {})", status, rt.event_variants().join(""));
    print_steps(&rt);

    // la aprobación quedó consumida; una segunda posición vuelve a necesitar
    // approve, pero con allowance previa el flujo se acorta
    let branch = demo.protocol.branch(BranchId(0)).map_err(|e| FlowError::Internal(e.to_string()))?;
    demo.chain.set_allowance(branch.contracts.coll_token,
                             ACCOUNT,
                             branch.contracts.borrower_operations,
                             Amount::MAX);
    let mut raw = open_request(0);
    raw["ownerIndex"] = json!(1);
    let mut rt = FlowRuntime::new(OpenBorrowPosition::new(Arc::clone(&demo.protocol)),
                                  demo.env.clone(),
                                  InMemoryEventStore::new(),
                                  ACCOUNT,
                                  &raw)?;
    let status = rt.start().await?;
    println!("  segunda posición: {:?} (eventos: {})", status, rt.event_variants().join(""));
    print_steps(&rt);
    Ok(())
}

/// Rechazo en la wallet: el flujo se detiene con el error del paso y el
/// reintento re-resuelve la lista y vuelve a intentar el approve.
async fn demo_rejection_and_retry() -> Result<(), FlowError> {
    println!("== demo: rechazo en la wallet y reintento ==");
    let demo = demo_env();
    demo.chain.reject_next_write();

    let mut rt = FlowRuntime::new(OpenBorrowPosition::new(Arc::clone(&demo.protocol)),
                                  demo.env.clone(),
                                  InMemoryEventStore::new(),
                                  ACCOUNT,
                                  &open_request(0))?;
    match rt.start().await {
        Err(FlowError::UserRejected) => println!("  intento 1: rechazado en la wallet ({:?})", rt.status()),
        other => println!("  intento 1: inesperado {:?}", other),
    }
    let status = rt.start().await?;
    println!("  intento 2: {:?} (eventos: {})", status, rt.event_variants().join(""));
    Ok(())
}

/// Reanudación desde disco: el flujo queda varado esperando al indexador,
/// el "proceso" se reinicia, y el log persistido permite retomar en verify
/// sin re-enviar la transacción.
async fn demo_reload_from_disk() -> Result<(), FlowError> {
    println!("== demo: reanudación desde el log persistido ==");
    let demo = demo_env();
    demo.chain.set_indexer_lag(8); // más consultas que la cota de sondeo

    let state_dir = StoreConfig::from_env().state_dir;
    let store = FileEventStore::open(&state_dir).map_err(|e| FlowError::Internal(e.to_string()))?;

    let mut rt = FlowRuntime::new(OpenBorrowPosition::new(Arc::clone(&demo.protocol)),
                                  demo.env.clone(),
                                  store,
                                  ACCOUNT,
                                  &open_request(0))?;
    let flow_id = rt.flow_id();
    match rt.start().await {
        Err(FlowError::VerificationStalled) => {
            println!("  corrida 1: {:?}: el indexador todavía no refleja el trove", rt.status())
        }
        other => println!("  corrida 1: inesperado {:?}", other),
    }
    drop(rt); // el proceso "muere": sólo queda el log en disco

    let store = FileEventStore::open(&state_dir).map_err(|e| FlowError::Internal(e.to_string()))?;
    let mut rt = FlowRuntime::resume(OpenBorrowPosition::new(Arc::clone(&demo.protocol)),
                                     demo.env.clone(),
                                     store,
                                     flow_id)?;
    let status = rt.start().await?;
    println!("  corrida 2: {:?} (eventos: {})", status, rt.event_variants().join(""));
    print_steps(&rt);
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = demo_adaptive_steps().await {
        eprintln!("demo adaptativa falló: {}", e);
    }
    if let Err(e) = demo_rejection_and_retry().await {
        eprintln!("demo de rechazo falló: {}", e);
    }
    if let Err(e) = demo_reload_from_disk().await {
        eprintln!("demo de reanudación falló: {}", e);
    }
}
