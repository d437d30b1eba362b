//! Helpers compartidos por las declaraciones de flujo.

use mint_core::{ApproveMethod, FlowContext, FlowError};
use mint_domain::{Address, Amount, Branch, CollSymbol, GAS_COMPENSATION};

use crate::calls;

/// Monto a aprobar según la preferencia del usuario: el requerido exacto o
/// la aprobación infinita que evita futuros pasos de approve.
pub(crate) fn approval_amount(method: ApproveMethod, required: Amount) -> Amount {
    match method {
        ApproveMethod::Exact => required,
        ApproveMethod::Infinite => Amount::MAX,
    }
}

/// Allowance de colateral que necesita `openTrove`. En la rama WANKR el
/// colateral y el depósito de gas son el mismo token: la aprobación debe
/// cubrir ambos.
pub(crate) fn required_coll_allowance(branch: &Branch, coll_amount: Amount) -> Amount {
    if branch.symbol == CollSymbol::Wankr {
        coll_amount.saturating_add(GAS_COMPENSATION)
    } else {
        coll_amount
    }
}

/// Lee una allowance ERC-20 vigente. Para uso en `get_steps`: cualquier
/// falla de lectura se reporta como resolución fallida (reintentable).
pub(crate) async fn read_allowance<R: Send + Sync>(ctx: &FlowContext<R>,
                                                   token: Address,
                                                   spender: Address)
                                                   -> Result<Amount, FlowError> {
    let value = ctx.read_contract(&calls::allowance(token, ctx.account, spender))
                   .await
                   .map_err(|e| FlowError::StepResolution(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| FlowError::StepResolution(format!("bad allowance value: {}", e)))
}
