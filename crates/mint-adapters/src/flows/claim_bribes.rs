//! Flujo `claimBribes`: reclama los bribes acumulados por una iniciativa en
//! épocas pasadas.
//!
//! Un bribe recién queda reclamable cuando su época terminó: la resolución
//! de pasos lee el estado de época vigente y rechaza requests que incluyan
//! la época en curso o futuras, antes de tocar la wallet.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mint_core::{validators, FlowContext, FlowDeclaration, FlowError, RequestSchema, StepContract, StepRegistry};
use mint_domain::{Address, GovernanceState, Protocol, TxHash};

use crate::calls;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBribesRequest {
    pub initiative: Address,
    /// Épocas a reclamar, todas anteriores a la época en curso.
    pub epochs: Vec<u64>,
}

pub struct ClaimBribes {
    protocol: Arc<Protocol>,
}

impl ClaimBribes {
    pub fn new(protocol: Arc<Protocol>) -> Self {
        ClaimBribes { protocol }
    }
}

struct ClaimStep {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<ClaimBribesRequest> for ClaimStep {
    fn name(&self, _ctx: &FlowContext<ClaimBribesRequest>) -> String {
        "Claim bribes".to_string()
    }

    async fn commit(&self, ctx: &mut FlowContext<ClaimBribesRequest>) -> Result<TxHash, FlowError> {
        ctx.write_contract(&calls::claim_bribes(self.protocol.governance,
                                                ctx.request.initiative,
                                                &ctx.request.epochs))
           .await
    }

    async fn verify(&self, ctx: &mut FlowContext<ClaimBribesRequest>, hash: TxHash) -> Result<(), FlowError> {
        ctx.wait_for_receipt(hash).await.map(|_| ())
    }
}

#[async_trait]
impl FlowDeclaration for ClaimBribes {
    type Request = ClaimBribesRequest;

    fn name(&self) -> &'static str {
        "claimBribes"
    }

    fn schema(&self) -> RequestSchema {
        RequestSchema::new().field("initiative", validators::address)
                            .field("epochs", validators::non_empty_array(validators::unsigned))
    }

    fn steps(&self) -> StepRegistry<ClaimBribesRequest> {
        StepRegistry::new().register("claimBribes", ClaimStep { protocol: Arc::clone(&self.protocol) })
    }

    async fn get_steps(&self, ctx: &FlowContext<ClaimBribesRequest>) -> Result<Vec<String>, FlowError> {
        let value = ctx.read_contract(&calls::epoch_state(self.protocol.governance))
                       .await
                       .map_err(|e| FlowError::StepResolution(e.to_string()))?;
        let state: GovernanceState =
            serde_json::from_value(value).map_err(|e| FlowError::StepResolution(format!("bad epoch state: {}", e)))?;

        if let Some(epoch) = ctx.request.epochs.iter().find(|e| **e >= state.epoch) {
            return Err(FlowError::StepResolution(format!(
                "bribes for epoch {} are not claimable until the epoch ends (current epoch: {})",
                epoch, state.epoch
            )));
        }
        Ok(vec!["claimBribes".to_string()])
    }
}
