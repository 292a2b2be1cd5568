//! Fixed-point arithmetic used throughout the engine.
//!
//! Unsigned helpers operate on [`U256`] and widen to [`U512`] for the product,
//! so `a * b / d` never overflows before the division. Every helper is
//! fallible: a zero divisor yields [`MorphoError::DivideByZero`] and a result
//! that does not fit 256 bits yields [`MorphoError::Uint256Overflow`].
//!
//! Signed helpers operate on [`I256`] and truncate toward zero, matching the
//! `wMulToZero` / `wDivToZero` semantics the interest rate model relies on.

use alloy_primitives::{I256, U256, U512};

use crate::error::{MorphoError, Result};

/// WAD = 1e18, the fixed-point scale.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Seconds per year (365 days).
pub const SECONDS_PER_YEAR: U256 = U256::from_limbs([31_536_000, 0, 0, 0]);

/// Rounding direction for share and fixed-point conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingDirection {
    Up,
    Down,
}

fn widen(x: U256) -> U512 {
    let [l0, l1, l2, l3] = *x.as_limbs();
    U512::from_limbs([l0, l1, l2, l3, 0, 0, 0, 0])
}

fn narrow(x: U512) -> Result<U256> {
    let [l0, l1, l2, l3, l4, l5, l6, l7] = *x.as_limbs();
    if l4 | l5 | l6 | l7 != 0 {
        return Err(MorphoError::Uint256Overflow);
    }
    Ok(U256::from_limbs([l0, l1, l2, l3]))
}

/// Returns `(x * y) / d` rounded down.
pub fn mul_div_down(x: U256, y: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(MorphoError::DivideByZero);
    }
    narrow(widen(x) * widen(y) / widen(d))
}

/// Returns `(x * y) / d` rounded up.
pub fn mul_div_up(x: U256, y: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(MorphoError::DivideByZero);
    }
    let product = widen(x) * widen(y);
    let d = widen(d);
    let quotient = narrow(product / d)?;
    if (product % d).is_zero() {
        Ok(quotient)
    } else {
        checked_add(quotient, U256::from(1))
    }
}

/// Returns `(x * y) / d` rounded in the given direction.
pub fn mul_div(x: U256, y: U256, d: U256, rounding: RoundingDirection) -> Result<U256> {
    match rounding {
        RoundingDirection::Down => mul_div_down(x, y, d),
        RoundingDirection::Up => mul_div_up(x, y, d),
    }
}

/// Returns `(x * y) / WAD` rounded down.
pub fn w_mul_down(x: U256, y: U256) -> Result<U256> {
    mul_div_down(x, y, WAD)
}

/// Returns `(x * y) / WAD` rounded up.
pub fn w_mul_up(x: U256, y: U256) -> Result<U256> {
    mul_div_up(x, y, WAD)
}

/// Returns `(x * WAD) / y` rounded down.
pub fn w_div_down(x: U256, y: U256) -> Result<U256> {
    mul_div_down(x, WAD, y)
}

/// Returns `(x * WAD) / y` rounded up.
pub fn w_div_up(x: U256, y: U256) -> Result<U256> {
    mul_div_up(x, WAD, y)
}

/// Returns the sum of the first three non-zero terms of a Taylor expansion of
/// `e^(n * x) - 1`, used to approximate continuous compounding.
///
/// ```rust
/// use morpho_rs_blue::math::w_taylor_compounded;
/// use alloy_primitives::U256;
///
/// let result = w_taylor_compounded(U256::from(4214), U256::from(244)).unwrap();
/// assert_eq!(result, U256::from(1_028_216));
/// ```
pub fn w_taylor_compounded(x: U256, n: U256) -> Result<U256> {
    let first_term = x.checked_mul(n).ok_or(MorphoError::Uint256Overflow)?;
    let second_term = mul_div_down(first_term, first_term, U256::from(2) * WAD)?;
    let third_term = mul_div_down(second_term, first_term, U256::from(3) * WAD)?;

    checked_add(checked_add(first_term, second_term)?, third_term)
}

/// Maps the `None` of a checked operation to [`MorphoError::Uint256Overflow`].
pub trait OverflowExt<T> {
    fn overflow(self) -> Result<T>;
}

impl<T> OverflowExt<T> for Option<T> {
    fn overflow(self) -> Result<T> {
        self.ok_or(MorphoError::Uint256Overflow)
    }
}

/// Overflow-checked addition.
pub fn checked_add(x: U256, y: U256) -> Result<U256> {
    x.checked_add(y).ok_or(MorphoError::Uint256Overflow)
}

/// Underflow-checked subtraction.
pub fn checked_sub(x: U256, y: U256) -> Result<U256> {
    x.checked_sub(y).ok_or(MorphoError::Uint256Overflow)
}

/// Returns `max(0, x - y)`.
pub fn zero_floor_sub(x: U256, y: U256) -> U256 {
    x.saturating_sub(y)
}

/// Returns the minimum of two values.
pub fn min(x: U256, y: U256) -> U256 {
    if x < y {
        x
    } else {
        y
    }
}

/// Returns the maximum of two values.
pub fn max(x: U256, y: U256) -> U256 {
    if x > y {
        x
    } else {
        y
    }
}

// ==================== Signed Arithmetic ====================

/// Reinterprets an unsigned value as signed, failing if it does not fit.
pub fn to_signed(x: U256) -> Result<I256> {
    if x > I256::MAX.into_raw() {
        return Err(MorphoError::Uint256Overflow);
    }
    Ok(I256::from_raw(x))
}

/// Converts a non-negative signed value back to unsigned.
pub fn to_unsigned(x: I256) -> Result<U256> {
    if x < I256::ZERO {
        return Err(MorphoError::Uint256Overflow);
    }
    Ok(x.into_raw())
}

/// Builds a signed value from a native integer.
pub fn signed_from_i128(x: i128) -> I256 {
    let magnitude = I256::from_raw(U256::from(x.unsigned_abs()));
    if x < 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn wad_int() -> I256 {
    I256::from_raw(WAD)
}

/// Returns `(x * y) / WAD`, truncated toward zero.
pub fn w_mul_to_zero(x: I256, y: I256) -> Result<I256> {
    x.checked_mul(y)
        .and_then(|product| product.checked_div(wad_int()))
        .ok_or(MorphoError::Uint256Overflow)
}

/// Returns `(x * WAD) / y`, truncated toward zero.
pub fn w_div_to_zero(x: I256, y: I256) -> Result<I256> {
    if y == I256::ZERO {
        return Err(MorphoError::DivideByZero);
    }
    x.checked_mul(wad_int())
        .and_then(|scaled| scaled.checked_div(y))
        .ok_or(MorphoError::Uint256Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_up_vectors() {
        assert_eq!(
            mul_div_up(U256::from(10), U256::from(3), U256::from(7)).unwrap(),
            U256::from(5)
        );
        assert_eq!(
            mul_div_up(U256::from(100), U256::from(7), U256::from(13)).unwrap(),
            U256::from(54)
        );
    }

    #[test]
    fn test_mul_div_up_zero_numerator() {
        assert_eq!(
            mul_div_up(U256::ZERO, U256::from(123), U256::from(7)).unwrap(),
            U256::ZERO
        );
    }

    #[test]
    fn test_mul_div_divide_by_zero() {
        assert_eq!(
            mul_div_up(U256::from(1), U256::from(2), U256::ZERO),
            Err(MorphoError::DivideByZero)
        );
        assert_eq!(
            mul_div_down(U256::from(1), U256::from(2), U256::ZERO),
            Err(MorphoError::DivideByZero)
        );
    }

    #[test]
    fn test_mul_div_down_exact_and_floor() {
        assert_eq!(
            mul_div_down(U256::from(10), U256::from(3), U256::from(7)).unwrap(),
            U256::from(4)
        );
        assert_eq!(
            mul_div_down(U256::from(21), U256::from(3), U256::from(7)).unwrap(),
            U256::from(9)
        );
        assert_eq!(
            mul_div_up(U256::from(21), U256::from(3), U256::from(7)).unwrap(),
            U256::from(9)
        );
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // MAX * MAX / MAX does not fit the product in 256 bits but the result does
        assert_eq!(
            mul_div_down(U256::MAX, U256::MAX, U256::MAX).unwrap(),
            U256::MAX
        );
        assert_eq!(
            mul_div_up(U256::MAX, U256::MAX, U256::MAX).unwrap(),
            U256::MAX
        );
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(
            mul_div_down(U256::MAX, U256::from(2), U256::from(1)),
            Err(MorphoError::Uint256Overflow)
        );
        assert_eq!(
            mul_div_up(U256::MAX, U256::from(3), U256::from(2)),
            Err(MorphoError::Uint256Overflow)
        );
    }

    #[test]
    fn test_wad_helpers() {
        let half = WAD / U256::from(2);
        assert_eq!(w_mul_down(WAD, half).unwrap(), half);
        assert_eq!(w_div_down(half, WAD).unwrap(), half);
        assert_eq!(w_mul_down(U256::from(1), U256::from(1)).unwrap(), U256::ZERO);
        assert_eq!(w_mul_up(U256::from(1), U256::from(1)).unwrap(), U256::from(1));
        assert_eq!(
            w_div_up(U256::from(1), U256::from(3)).unwrap(),
            U256::from(333_333_333_333_333_334u64)
        );
    }

    #[test]
    fn test_w_taylor_compounded_vectors() {
        assert_eq!(
            w_taylor_compounded(U256::from(2), U256::from(5)).unwrap(),
            U256::from(10)
        );
        assert_eq!(
            w_taylor_compounded(U256::from(4214), U256::from(244)).unwrap(),
            U256::from(1_028_216)
        );
    }

    #[test]
    fn test_w_taylor_compounded_one_year_at_ten_percent() {
        // 10% APR per second for one year, three terms of e^0.1 - 1 = 0.10517
        let rate = U256::from(100_000_000_000_000_000u64) / SECONDS_PER_YEAR;
        let compounded = w_taylor_compounded(rate, SECONDS_PER_YEAR).unwrap();
        assert_eq!(compounded, U256::from(105_166_666_653_548_106u64));
    }

    #[test]
    fn test_signed_truncates_toward_zero() {
        let wad = I256::from_raw(WAD);
        let minus_seven = signed_from_i128(-7);
        let two = signed_from_i128(2);
        // -7 / 2 => -3 (not -4)
        assert_eq!(
            w_div_to_zero(minus_seven, two * wad).unwrap(),
            signed_from_i128(-3)
        );
        // -7 * 0.5 => -3
        assert_eq!(
            w_mul_to_zero(minus_seven, wad / two).unwrap(),
            signed_from_i128(-3)
        );
        assert_eq!(w_div_to_zero(wad, I256::ZERO), Err(MorphoError::DivideByZero));
    }

    #[test]
    fn test_signed_conversions() {
        assert_eq!(to_unsigned(to_signed(WAD).unwrap()).unwrap(), WAD);
        assert_eq!(to_signed(U256::MAX), Err(MorphoError::Uint256Overflow));
        assert_eq!(
            to_unsigned(signed_from_i128(-1)),
            Err(MorphoError::Uint256Overflow)
        );
    }

    #[test]
    fn test_zero_floor_sub_min_max() {
        assert_eq!(zero_floor_sub(U256::from(1), U256::from(2)), U256::ZERO);
        assert_eq!(zero_floor_sub(U256::from(5), U256::from(2)), U256::from(3));
        assert_eq!(min(U256::from(1), U256::from(2)), U256::from(1));
        assert_eq!(max(U256::from(1), U256::from(2)), U256::from(2));
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert_eq!(
            checked_sub(U256::from(1), U256::from(2)),
            Err(MorphoError::Uint256Overflow)
        );
    }
}
