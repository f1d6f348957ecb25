//! Swap fee schedule
//!
//! Every fee is carved out of the constant-product output before it reaches
//! the trader. Rounding is always floor, so any dust stays in the pool.

use serde::{Deserialize, Serialize};

use crate::numeric::{mul_div_floor, Amount, BPS_DENOMINATOR};

/// Liquidity-provider fee: 2 / 1000 (0.20%), retained by the pool.
pub const LP_FEE_NUMERATOR: u64 = 2;
pub const LP_FEE_DENOMINATOR: u64 = 1_000;

/// Protocol fee in basis points (0.05%).
pub const PROTOCOL_FEE_BPS: u64 = 5;

/// Decomposition of one swap's output.
///
/// `amount_out_before_fee == amount_out + lp_fee + frontend_fee + protocol_fee`
/// holds for every value produced by [`FeeBreakdown::from_gross`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub amount_out_before_fee: Amount,
    pub lp_fee: Amount,
    pub frontend_fee: Amount,
    pub protocol_fee: Amount,
    pub amount_out: Amount,
}

impl FeeBreakdown {
    /// Split a gross output amount into fees and the trader's share.
    ///
    /// Returns `None` if the fees together would exceed the gross amount,
    /// which only happens for frontend rates far above any sane cap.
    pub fn from_gross(amount_out_before_fee: Amount, frontend_fee_bps: u64) -> Option<Self> {
        let lp_fee = mul_div_floor(amount_out_before_fee, LP_FEE_NUMERATOR, LP_FEE_DENOMINATOR)?;
        let frontend_fee = mul_div_floor(amount_out_before_fee, frontend_fee_bps, BPS_DENOMINATOR)?;
        let protocol_fee = mul_div_floor(amount_out_before_fee, PROTOCOL_FEE_BPS, BPS_DENOMINATOR)?;

        let amount_out = amount_out_before_fee
            .checked_sub(lp_fee)?
            .checked_sub(frontend_fee)?
            .checked_sub(protocol_fee)?;

        Some(Self {
            amount_out_before_fee,
            lp_fee,
            frontend_fee,
            protocol_fee,
            amount_out,
        })
    }
}
