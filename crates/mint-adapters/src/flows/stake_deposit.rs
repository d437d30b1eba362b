//! Flujo `stakeDeposit`: deposita tokens de gobernanza para obtener poder
//! de voto. Approve previo sólo si la allowance del token no alcanza.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mint_core::{validators, FlowContext, FlowDeclaration, FlowError, RequestSchema, StatusView, StepContract,
                StepRegistry};
use mint_domain::{Amount, Protocol, TxHash};

use crate::calls;
use crate::flows::shared::{approval_amount, read_allowance};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDepositRequest {
    pub amount: Amount,
}

pub struct StakeDeposit {
    protocol: Arc<Protocol>,
}

impl StakeDeposit {
    pub fn new(protocol: Arc<Protocol>) -> Self {
        StakeDeposit { protocol }
    }
}

struct ApproveGov {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<StakeDepositRequest> for ApproveGov {
    fn name(&self, _ctx: &FlowContext<StakeDepositRequest>) -> String {
        "Approve governance token".to_string()
    }

    fn status_view(&self) -> StatusView {
        StatusView::ApprovalOnly
    }

    async fn commit(&self, ctx: &mut FlowContext<StakeDepositRequest>) -> Result<TxHash, FlowError> {
        let amount = approval_amount(ctx.approve_method(), ctx.request.amount);
        ctx.write_contract(&calls::approve(self.protocol.gov_token, self.protocol.governance, amount))
           .await
    }

    async fn verify(&self, ctx: &mut FlowContext<StakeDepositRequest>, hash: TxHash) -> Result<(), FlowError> {
        ctx.wait_for_receipt(hash).await.map(|_| ())
    }
}

struct DepositGov {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<StakeDepositRequest> for DepositGov {
    fn name(&self, _ctx: &FlowContext<StakeDepositRequest>) -> String {
        "Stake deposit".to_string()
    }

    async fn commit(&self, ctx: &mut FlowContext<StakeDepositRequest>) -> Result<TxHash, FlowError> {
        ctx.write_contract(&calls::deposit_gov(self.protocol.governance, ctx.request.amount))
           .await
    }

    async fn verify(&self, ctx: &mut FlowContext<StakeDepositRequest>, hash: TxHash) -> Result<(), FlowError> {
        ctx.wait_for_receipt(hash).await.map(|_| ())
    }
}

#[async_trait]
impl FlowDeclaration for StakeDeposit {
    type Request = StakeDepositRequest;

    fn name(&self) -> &'static str {
        "stakeDeposit"
    }

    fn schema(&self) -> RequestSchema {
        RequestSchema::new().field("amount", validators::positive_amount)
    }

    fn steps(&self) -> StepRegistry<StakeDepositRequest> {
        StepRegistry::new().register("approveGov", ApproveGov { protocol: Arc::clone(&self.protocol) })
                           .register("depositGov", DepositGov { protocol: Arc::clone(&self.protocol) })
    }

    async fn get_steps(&self, ctx: &FlowContext<StakeDepositRequest>) -> Result<Vec<String>, FlowError> {
        let allowance = read_allowance(ctx, self.protocol.gov_token, self.protocol.governance).await?;

        let mut steps: Vec<String> = Vec::new();
        if allowance < ctx.request.amount {
            steps.push("approveGov".to_string());
        }
        steps.push("depositGov".to_string());
        Ok(steps)
    }
}
