use crate::Amount;

/// Depósito de gas reembolsable exigido al abrir una posición, en wANKR.
/// Sólo se consume en caso de liquidación.
pub const GAS_COMPENSATION: Amount = Amount(37_500_000_000_000_000); // 0.0375
