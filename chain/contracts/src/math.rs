//! Constant product AMM math (x·y=k)
//!
//! Integer only, truncating division throughout. Every formula is evaluated
//! against the caller's reserve/supply bounds rather than the live values, so
//! a result computed here is never more favourable to the caller than the
//! live state would allow.

use types::numeric::{mul_div_floor, Amount};

use crate::errors::PoolError;

/// Gross output of a swap, before fees.
///
/// `floor(balance_out_min * amount_in / (balance_in_max + amount_in))`
pub fn swap_output(amount_in: Amount, balance_in_max: Amount, balance_out_min: Amount) -> Result<Amount, PoolError> {
    if amount_in == 0 {
        return Err(PoolError::ZeroAmount);
    }
    let denominator = balance_in_max.checked_add(amount_in).ok_or(PoolError::Overflow)?;
    mul_div_floor(balance_out_min, amount_in, denominator).ok_or(PoolError::Overflow)
}

/// Shares minted to the first provider, and the total supply afterwards.
///
/// Supply starts at `amount0 + amount1`; `minimum_liquidity` of it is locked
/// forever and the rest goes to the provider.
pub fn first_liquidity(
    amount0: Amount,
    amount1: Amount,
    minimum_liquidity: Amount,
) -> Result<(Amount, Amount), PoolError> {
    if amount0 == 0 || amount1 == 0 {
        return Err(PoolError::ZeroAmount);
    }
    let supply = amount0.checked_add(amount1).ok_or(PoolError::Overflow)?;
    if supply <= minimum_liquidity {
        return Err(PoolError::InsufficientLiquidity);
    }
    Ok((supply - minimum_liquidity, supply))
}

/// Shares minted for a proportional deposit into a live pool.
///
/// `min(amount0 * supply_min / reserve0_max, amount1 * supply_min / reserve1_max)`
pub fn supply_liquidity(
    amount0: Amount,
    amount1: Amount,
    reserve0_max: Amount,
    reserve1_max: Amount,
    supply_min: Amount,
) -> Result<Amount, PoolError> {
    if amount0 == 0 || amount1 == 0 {
        return Err(PoolError::ZeroAmount);
    }
    if reserve0_max == 0 || reserve1_max == 0 || supply_min == 0 {
        return Err(PoolError::InsufficientLiquidity);
    }
    let shares0 = mul_div_floor(amount0, supply_min, reserve0_max).ok_or(PoolError::Overflow)?;
    let shares1 = mul_div_floor(amount1, supply_min, reserve1_max).ok_or(PoolError::Overflow)?;
    let shares = shares0.min(shares1);
    if shares == 0 {
        return Err(PoolError::InsufficientLiquidity);
    }
    Ok(shares)
}

/// Reserve paid out for burning `liquidity` shares.
///
/// `floor(reserve_min * liquidity / supply_max)`
pub fn withdraw_amount(reserve_min: Amount, liquidity: Amount, supply_max: Amount) -> Result<Amount, PoolError> {
    if liquidity == 0 {
        return Err(PoolError::ZeroAmount);
    }
    if supply_max == 0 || liquidity > supply_max {
        return Err(PoolError::InsufficientLiquidity);
    }
    mul_div_floor(reserve_min, liquidity, supply_max).ok_or(PoolError::Overflow)
}
