//! mint-core: motor de orquestación de flujos de transacciones on-chain.
pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod flow;
pub mod hashing;
pub mod model;
pub mod ports;
pub mod runtime;
pub mod step;

pub use config::{EngineConfig, PollPolicy, CONFIG};
pub use errors::{FieldIssue, FlowError, ValidationError};
pub use event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use flow::{ErasedDeclaration, FlowDeclaration, FlowRegistry, StepRegistry};
pub use model::{validators, ApproveMethod, FlowContext, FlowEnv, RequestSchema};
pub use ports::{CallSpec, ChainClient, IndexerClient, Receipt, ReceiptLog, ReceiptWatcher};
pub use runtime::{poll_until_visible, FlowInstance, FlowRuntime, FlowStatus};
pub use step::{StatusView, StepContract, StepState, StepStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};

    use mint_domain::TxHash;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct PingRequest {
        owner: String,
    }

    struct PingStep;

    #[async_trait]
    impl StepContract<PingRequest> for PingStep {
        fn name(&self, _ctx: &FlowContext<PingRequest>) -> String {
            "Ping".into()
        }
        async fn commit(&self, _ctx: &mut FlowContext<PingRequest>) -> Result<TxHash, FlowError> {
            Ok(TxHash::dev(1))
        }
        async fn verify(&self, _ctx: &mut FlowContext<PingRequest>, _hash: TxHash) -> Result<(), FlowError> {
            Ok(())
        }
    }

    struct PingFlow;

    #[async_trait]
    impl FlowDeclaration for PingFlow {
        type Request = PingRequest;

        fn name(&self) -> &'static str {
            "ping"
        }

        fn schema(&self) -> RequestSchema {
            RequestSchema::new().field("owner", validators::address)
        }

        fn steps(&self) -> StepRegistry<PingRequest> {
            StepRegistry::new().register("ping", PingStep)
        }

        async fn get_steps(&self, _ctx: &FlowContext<PingRequest>) -> Result<Vec<String>, FlowError> {
            Ok(vec!["ping".into()])
        }
    }

    #[test]
    fn registry_validates_by_flow_name() {
        let registry = FlowRegistry::new().register(PingFlow);
        assert!(registry.contains("ping"));

        let good = json!({"owner": "0x00000000000000000000000000000000000000aa"});
        let normalized = registry.validate("ping", &good).expect("valid request");
        assert_eq!(normalized["owner"], good["owner"]);

        let bad = json!({"owner": 42});
        match registry.validate("ping", &bad) {
            Err(FlowError::Validation(err)) => assert_eq!(err.issues[0].field, "owner"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_flow_is_rejected_before_validation() {
        let registry = FlowRegistry::new().register(PingFlow);
        let err = registry.validate("closeTrove", &Value::Null).unwrap_err();
        assert_eq!(err, FlowError::UnknownFlow("closeTrove".into()));
    }

    #[test]
    fn step_registry_preserves_declaration_order() {
        let registry: StepRegistry<PingRequest> = StepRegistry::new().register("approveLst", PingStep)
                                                                     .register("approveWeth", PingStep)
                                                                     .register("openTrove", PingStep);
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["approveLst", "approveWeth", "openTrove"]);
    }

    #[test]
    fn parse_request_normalizes_through_the_type() {
        let raw = json!({"owner": "0x00000000000000000000000000000000000000aa"});
        let request = PingFlow.parse_request(&raw).unwrap();
        assert_eq!(request.owner, "0x00000000000000000000000000000000000000aa");
    }
}
