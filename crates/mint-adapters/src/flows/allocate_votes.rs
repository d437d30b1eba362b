//! Flujo `allocateVotes`: distribuye el stake de gobernanza entre
//! iniciativas, a favor o en veto.
//!
//! Regla de época: durante el período de corte (la última fracción de cada
//! época) sólo se aceptan vetos nuevos. La regla se aplica en la resolución
//! de pasos, contra el estado de época leído en ese momento: un request con
//! upvotes presentado durante el corte falla antes de tocar la wallet.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mint_core::{validators, FlowContext, FlowDeclaration, FlowError, RequestSchema, StepContract, StepRegistry};
use mint_domain::{Address, Amount, GovernancePeriod, GovernanceState, Protocol, TxHash, Vote};

use crate::calls;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAllocation {
    pub initiative: Address,
    pub vote: Vote,
    pub qty: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateVotesRequest {
    pub allocations: Vec<VoteAllocation>,
}

pub struct AllocateVotes {
    protocol: Arc<Protocol>,
}

impl AllocateVotes {
    pub fn new(protocol: Arc<Protocol>) -> Self {
        AllocateVotes { protocol }
    }

    async fn epoch_state<R: Send + Sync>(&self, ctx: &FlowContext<R>) -> Result<GovernanceState, FlowError> {
        let value = ctx.read_contract(&calls::epoch_state(self.protocol.governance))
                       .await
                       .map_err(|e| FlowError::StepResolution(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| FlowError::StepResolution(format!("bad epoch state: {}", e)))
    }
}

fn allocation_field(value: &Value) -> Result<(), String> {
    let item = value.as_object().ok_or("expected an allocation object")?;
    match item.get("initiative") {
        Some(v) => validators::address(v)?,
        None => return Err("missing initiative".into()),
    }
    match item.get("vote").and_then(|v| v.as_str()) {
        Some("up") | Some("down") => {}
        _ => return Err("vote must be \"up\" or \"down\"".into()),
    }
    match item.get("qty") {
        Some(v) => validators::positive_amount(v)?,
        None => return Err("missing qty".into()),
    }
    Ok(())
}

struct AllocateStep {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<AllocateVotesRequest> for AllocateStep {
    fn name(&self, _ctx: &FlowContext<AllocateVotesRequest>) -> String {
        "Cast votes".to_string()
    }

    async fn commit(&self, ctx: &mut FlowContext<AllocateVotesRequest>) -> Result<TxHash, FlowError> {
        let mut initiatives = Vec::with_capacity(ctx.request.allocations.len());
        let mut upvotes = Vec::with_capacity(ctx.request.allocations.len());
        let mut downvotes = Vec::with_capacity(ctx.request.allocations.len());
        for allocation in &ctx.request.allocations {
            initiatives.push(allocation.initiative);
            match allocation.vote {
                Vote::Up => {
                    upvotes.push(allocation.qty);
                    downvotes.push(Amount::ZERO);
                }
                Vote::Down => {
                    upvotes.push(Amount::ZERO);
                    downvotes.push(allocation.qty);
                }
            }
        }
        ctx.write_contract(&calls::allocate_votes(self.protocol.governance, initiatives, upvotes, downvotes))
           .await
    }

    async fn verify(&self, ctx: &mut FlowContext<AllocateVotesRequest>, hash: TxHash) -> Result<(), FlowError> {
        ctx.wait_for_receipt(hash).await.map(|_| ())
    }
}

#[async_trait]
impl FlowDeclaration for AllocateVotes {
    type Request = AllocateVotesRequest;

    fn name(&self) -> &'static str {
        "allocateVotes"
    }

    fn schema(&self) -> RequestSchema {
        RequestSchema::new().field("allocations", validators::non_empty_array(allocation_field))
    }

    fn steps(&self) -> StepRegistry<AllocateVotesRequest> {
        StepRegistry::new().register("allocateVotes", AllocateStep { protocol: Arc::clone(&self.protocol) })
    }

    async fn get_steps(&self, ctx: &FlowContext<AllocateVotesRequest>) -> Result<Vec<String>, FlowError> {
        let state = self.epoch_state(ctx).await?;
        let has_upvotes = ctx.request.allocations.iter().any(|a| a.vote == Vote::Up);
        if state.period() == GovernancePeriod::Cutoff && has_upvotes {
            return Err(FlowError::StepResolution(format!(
                "epoch {} is in its cutoff period: only vetoes are accepted until the epoch ends",
                state.epoch
            )));
        }
        Ok(vec!["allocateVotes".to_string()])
    }
}
