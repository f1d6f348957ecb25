//! Off-chain swap quotes
//!
//! Mirrors the on-chain swap formula for a given reserve snapshot and adds
//! display figures (prices, impact) as [`Decimal`]. Nothing here is used to
//! settle a trade; settlement is integer-only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::fee::FeeBreakdown;
use types::numeric::{mul_div_floor, Amount, BPS_DENOMINATOR};

use crate::errors::PoolError;
use crate::math::swap_output;

/// Expected result of a swap against a reserve snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub amount_in: Amount,
    pub fees: FeeBreakdown,
    /// Output per unit of input before the trade
    pub spot_price: Decimal,
    /// Output per unit of input actually received
    pub effective_price: Decimal,
    /// `1 - effective / spot`
    pub price_impact: Decimal,
}

impl SwapQuote {
    pub fn new(
        reserve_in: Amount,
        reserve_out: Amount,
        amount_in: Amount,
        frontend_fee_bps: u64,
    ) -> Result<Self, PoolError> {
        if reserve_in == 0 || reserve_out == 0 {
            return Err(PoolError::NotSupplied);
        }
        let gross = swap_output(amount_in, reserve_in, reserve_out)?;
        let fees = FeeBreakdown::from_gross(gross, frontend_fee_bps).ok_or(PoolError::Overflow)?;

        let spot_price = Decimal::from(reserve_out) / Decimal::from(reserve_in);
        let effective_price = Decimal::from(fees.amount_out) / Decimal::from(amount_in);
        let price_impact = Decimal::ONE - effective_price / spot_price;

        Ok(Self {
            amount_in,
            fees,
            spot_price,
            effective_price,
            price_impact,
        })
    }

    /// Output after all fees.
    pub fn amount_out(&self) -> Amount {
        self.fees.amount_out
    }

    /// Smallest acceptable output for a tolerance in basis points.
    pub fn min_output(&self, slippage_bps: u64) -> Amount {
        let keep = BPS_DENOMINATOR.saturating_sub(slippage_bps);
        mul_div_floor(self.fees.amount_out, keep, BPS_DENOMINATOR).unwrap_or(0)
    }
}
