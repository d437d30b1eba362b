//! Flujo `openBorrowPosition`: abre una posición de préstamo contra una
//! rama de colateral.
//!
//! La forma del flujo depende del estado vivo de la cadena:
//! - `approveLst` sólo si la allowance del colateral no cubre lo requerido
//!   (en la rama WANKR lo requerido incluye el depósito de gas, porque
//!   colateral y gas son el mismo token);
//! - `approveWeth` sólo en ramas LST cuya allowance de wANKR no cubre el
//!   depósito de gas;
//! - `openTrove` siempre, en variante batch cuando hay delegado de interés.
//!
//! La verificación del `openTrove` extrae el trove id del log
//! `TroveOperation` y sondea el indexador hasta que la posición sea
//! visible: sólo entonces la UI puede navegar a la pantalla del préstamo.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mint_core::{validators, FlowContext, FlowDeclaration, FlowError, RequestSchema, StatusView, StepContract,
                StepRegistry};
use mint_domain::{Address, Amount, BranchId, CollSymbol, Protocol, TroveId, TxHash, GAS_COMPENSATION};

use crate::calls::{self, OpenTroveArgs};
use crate::flows::shared::{approval_amount, read_allowance, required_coll_allowance};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenBorrowPositionRequest {
    pub branch_id: BranchId,
    pub owner: Address,
    pub owner_index: u32,
    pub coll_amount: Amount,
    pub bold_amount: Amount,
    pub annual_interest_rate: Amount,
    pub max_upfront_fee: Amount,
    /// Delegado de tasa de interés; con delegado el trove entra a un batch.
    pub interest_rate_delegate: Option<Address>,
}

pub struct OpenBorrowPosition {
    protocol: Arc<Protocol>,
}

impl OpenBorrowPosition {
    pub fn new(protocol: Arc<Protocol>) -> Self {
        OpenBorrowPosition { protocol }
    }
}

struct ApproveLst {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<OpenBorrowPositionRequest> for ApproveLst {
    fn name(&self, ctx: &FlowContext<OpenBorrowPositionRequest>) -> String {
        match self.protocol.branch(ctx.request.branch_id) {
            Ok(branch) => format!("Approve {}", branch.symbol),
            Err(_) => "Approve collateral".to_string(),
        }
    }

    fn status_view(&self) -> StatusView {
        StatusView::ApprovalOnly
    }

    async fn commit(&self, ctx: &mut FlowContext<OpenBorrowPositionRequest>) -> Result<TxHash, FlowError> {
        let branch = *self.protocol
                          .branch(ctx.request.branch_id)
                          .map_err(|e| FlowError::Internal(e.to_string()))?;
        let required = required_coll_allowance(&branch, ctx.request.coll_amount);
        let amount = approval_amount(ctx.approve_method(), required);
        ctx.write_contract(&calls::approve(branch.contracts.coll_token,
                                           branch.contracts.borrower_operations,
                                           amount))
           .await
    }

    async fn verify(&self, ctx: &mut FlowContext<OpenBorrowPositionRequest>, hash: TxHash) -> Result<(), FlowError> {
        ctx.wait_for_receipt(hash).await.map(|_| ())
    }
}

struct ApproveWeth {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<OpenBorrowPositionRequest> for ApproveWeth {
    fn name(&self, _ctx: &FlowContext<OpenBorrowPositionRequest>) -> String {
        "Approve wANKR".to_string()
    }

    fn status_view(&self) -> StatusView {
        StatusView::ApprovalOnly
    }

    async fn commit(&self, ctx: &mut FlowContext<OpenBorrowPositionRequest>) -> Result<TxHash, FlowError> {
        let branch = *self.protocol
                          .branch(ctx.request.branch_id)
                          .map_err(|e| FlowError::Internal(e.to_string()))?;
        let amount = approval_amount(ctx.approve_method(), GAS_COMPENSATION);
        ctx.write_contract(&calls::approve(self.protocol.weth, branch.contracts.borrower_operations, amount))
           .await
    }

    async fn verify(&self, ctx: &mut FlowContext<OpenBorrowPositionRequest>, hash: TxHash) -> Result<(), FlowError> {
        ctx.wait_for_receipt(hash).await.map(|_| ())
    }
}

struct OpenTrove {
    protocol: Arc<Protocol>,
}

#[async_trait]
impl StepContract<OpenBorrowPositionRequest> for OpenTrove {
    fn name(&self, _ctx: &FlowContext<OpenBorrowPositionRequest>) -> String {
        "Open Position".to_string()
    }

    async fn commit(&self, ctx: &mut FlowContext<OpenBorrowPositionRequest>) -> Result<TxHash, FlowError> {
        let branch = *self.protocol
                          .branch(ctx.request.branch_id)
                          .map_err(|e| FlowError::Internal(e.to_string()))?;
        let args = OpenTroveArgs { owner: ctx.request.owner,
                                   owner_index: ctx.request.owner_index,
                                   coll_amount: ctx.request.coll_amount,
                                   bold_amount: ctx.request.bold_amount,
                                   annual_interest_rate: ctx.request.annual_interest_rate,
                                   max_upfront_fee: ctx.request.max_upfront_fee };
        let spec = match ctx.request.interest_rate_delegate {
            Some(delegate) => calls::open_trove_and_join_batch(&branch.contracts, &args, delegate),
            None => calls::open_trove(&branch.contracts, &args),
        };
        ctx.write_contract(&spec).await
    }

    async fn verify(&self, ctx: &mut FlowContext<OpenBorrowPositionRequest>, hash: TxHash) -> Result<(), FlowError> {
        let receipt = ctx.wait_for_receipt(hash).await?;

        let branch = *self.protocol
                          .branch(ctx.request.branch_id)
                          .map_err(|e| FlowError::Internal(e.to_string()))?;
        let trove_id: TroveId = receipt.find_log("TroveOperation")
                                       .filter(|log| log.address == branch.contracts.trove_manager)
                                       .and_then(|log| log.data.get("_troveId"))
                                       .and_then(|v| v.as_str())
                                       .and_then(|s| s.parse().ok())
                                       .ok_or_else(|| {
                                           FlowError::Internal("no TroveOperation log in receipt".to_string())
                                       })?;

        // la UI navega al préstamo recién abierto: esperar a que el modelo
        // de lectura lo refleje
        ctx.poll_entity("trove", &trove_id.indexed_key(branch.id)).await?;
        ctx.set_var("troveId", serde_json::json!(trove_id));
        Ok(())
    }
}

#[async_trait]
impl FlowDeclaration for OpenBorrowPosition {
    type Request = OpenBorrowPositionRequest;

    fn name(&self) -> &'static str {
        "openBorrowPosition"
    }

    fn schema(&self) -> RequestSchema {
        RequestSchema::new().field("branchId", validators::branch_id)
                            .field("owner", validators::address)
                            .field("ownerIndex", validators::unsigned)
                            .field("collAmount", validators::positive_amount)
                            .field("boldAmount", validators::positive_amount)
                            .field("annualInterestRate", validators::amount)
                            .field("maxUpfrontFee", validators::amount)
                            .field("interestRateDelegate", validators::nullable(validators::address))
    }

    fn steps(&self) -> StepRegistry<OpenBorrowPositionRequest> {
        StepRegistry::new().register("approveLst", ApproveLst { protocol: Arc::clone(&self.protocol) })
                           .register("approveWeth", ApproveWeth { protocol: Arc::clone(&self.protocol) })
                           .register("openTrove", OpenTrove { protocol: Arc::clone(&self.protocol) })
    }

    async fn get_steps(&self, ctx: &FlowContext<OpenBorrowPositionRequest>) -> Result<Vec<String>, FlowError> {
        let branch = *self.protocol
                          .branch(ctx.request.branch_id)
                          .map_err(|e| FlowError::StepResolution(e.to_string()))?;
        let spender = branch.contracts.borrower_operations;

        let mut steps: Vec<String> = Vec::new();

        let required = required_coll_allowance(&branch, ctx.request.coll_amount);
        let coll_allowance = read_allowance(ctx, branch.contracts.coll_token, spender).await?;
        if coll_allowance < required {
            steps.push("approveLst".to_string());
        }

        // en ramas LST el depósito de gas se paga en wANKR y necesita su
        // propia allowance
        if branch.symbol != CollSymbol::Wankr {
            let weth_allowance = read_allowance(ctx, self.protocol.weth, spender).await?;
            if weth_allowance < GAS_COMPENSATION {
                steps.push("approveWeth".to_string());
            }
        }

        steps.push("openTrove".to_string());
        Ok(steps)
    }
}
