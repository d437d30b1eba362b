//! El log JSON-lines debe sobrevivir al cierre del proceso: reabrir el
//! store devuelve exactamente los eventos persistidos y el replay
//! reconstruye la instancia lista para reanudar.

use std::fs::OpenOptions;
use std::io::Write;

use serde_json::json;
use uuid::Uuid;

use mint_core::runtime::load;
use mint_core::{EventStore, FlowEventKind, FlowStatus, StepStatus};
use mint_domain::{Address, TxHash};
use mint_persistence::FileEventStore;

fn initialized(flow_id: Uuid, store: &mut FileEventStore) {
    store.append_kind(flow_id,
                      FlowEventKind::FlowInitialized { flow: "openBorrowPosition".into(),
                                                       account: Address::dev(0xaa),
                                                       request: json!({ "collAmount": "10" }),
                                                       request_hash: "rh".into(),
                                                       definition_hash: "dh".into(),
                                                       step_ids: vec!["approveLst".into(), "openTrove".into()] });
}

#[test]
fn events_survive_a_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let flow_id = Uuid::new_v4();

    let mut store = FileEventStore::open(dir.path()).unwrap();
    initialized(flow_id, &mut store);
    store.append_kind(flow_id,
                      FlowEventKind::StepStarted { step_index: 0,
                                                   step_id: "approveLst".into() });
    store.append_kind(flow_id,
                      FlowEventKind::StepSubmitted { step_index: 0,
                                                     step_id: "approveLst".into(),
                                                     tx_hash: TxHash::dev(1) });
    let written = store.list(flow_id);
    drop(store);

    let reopened = FileEventStore::open(dir.path()).unwrap();
    assert_eq!(reopened.list(flow_id), written);
    assert_eq!(reopened.flow_ids(), vec![flow_id]);
}

#[test]
fn replay_reconstructs_a_resumable_instance() {
    let dir = tempfile::tempdir().unwrap();
    let flow_id = Uuid::new_v4();

    let mut store = FileEventStore::open(dir.path()).unwrap();
    initialized(flow_id, &mut store);
    store.append_kind(flow_id,
                      FlowEventKind::StepStarted { step_index: 0,
                                                   step_id: "approveLst".into() });
    store.append_kind(flow_id,
                      FlowEventKind::StepSubmitted { step_index: 0,
                                                     step_id: "approveLst".into(),
                                                     tx_hash: TxHash::dev(1) });
    store.append_kind(flow_id,
                      FlowEventKind::StepSucceeded { step_index: 0,
                                                     step_id: "approveLst".into(),
                                                     tx_hash: TxHash::dev(1) });
    drop(store);

    let reopened = FileEventStore::open(dir.path()).unwrap();
    let instance = load(flow_id, &reopened.list(flow_id)).unwrap();
    assert_eq!(instance.status, FlowStatus::Running);
    assert_eq!(instance.steps[0].status, StepStatus::Succeeded);
    // reanudar retoma en el openTrove, sin re-pedir la firma del approve
    assert_eq!(instance.cursor(), Some(1));
}

#[test]
fn corrupt_lines_are_skipped_without_losing_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let flow_id = Uuid::new_v4();

    let mut store = FileEventStore::open(dir.path()).unwrap();
    initialized(flow_id, &mut store);
    drop(store);

    let path = dir.path().join(format!("{}.jsonl", flow_id));
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "{{ not json").unwrap();
    drop(file);

    let reopened = FileEventStore::open(dir.path()).unwrap();
    let events = reopened.list(flow_id);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].kind, FlowEventKind::FlowInitialized { .. }));
}

#[test]
fn foreign_files_in_the_state_dir_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a flow log").unwrap();
    std::fs::write(dir.path().join("not-a-uuid.jsonl"), "{}").unwrap();

    let store = FileEventStore::open(dir.path()).unwrap();
    assert!(store.flow_ids().is_empty());
}
