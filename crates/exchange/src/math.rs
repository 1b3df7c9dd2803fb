//! Proportional fill arithmetic.
//!
//! All partial amounts are `floor(numerator * target / denominator)` where
//! the fraction `numerator / denominator` is the filled share of the order.
//! Flooring always favors the paying side, so fills whose rounding loss
//! exceeds 1/1000 of the ideal amount are rejected outright instead of
//! silently shortchanging the receiving side.

use crate::error::MathError;
use primitive_types::U256;

/// `floor(numerator * target / denominator)` with overflow checking.
pub fn partial_amount_floor(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<U256, MathError> {
    let product = checked_mul(numerator, target)?;
    product
        .checked_div(denominator)
        .ok_or(MathError::DivisionByZero)
}

/// Whether flooring `numerator * target / denominator` discards at least
/// 1/1000 of the ideal unrounded amount.
///
/// The relative loss is `remainder / (numerator * target)`; comparing
/// `remainder * 1000 >= numerator * target` avoids any division. A zero
/// remainder (including a zero product) is never an error.
pub fn is_rounding_error_floor(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<bool, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = checked_mul(numerator, target)?;
    let remainder = product % denominator;
    if remainder.is_zero() {
        return Ok(false);
    }
    Ok(checked_mul(remainder, 1000.into())? >= product)
}

/// [`partial_amount_floor`] guarded by the rounding bound.
pub fn safe_partial_amount_floor(
    numerator: U256,
    denominator: U256,
    target: U256,
) -> Result<U256, MathError> {
    if is_rounding_error_floor(numerator, denominator, target)? {
        return Err(MathError::RoundingError {
            numerator,
            denominator,
            target,
        });
    }
    partial_amount_floor(numerator, denominator, target)
}

fn checked_mul(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow {
        numerator: a,
        target: b,
    })
}
