//! The adaptive curve interest rate model.
//!
//! Each market carries a `rate_at_target`: the borrow rate the curve returns
//! when utilization sits exactly at [`TARGET_UTILIZATION`]. Two mechanisms
//! move the rate a borrower pays.
//!
//! The curve maps the distance to the target onto a multiplier of
//! `rate_at_target`. At 100% utilization the rate is [`CURVE_STEEPNESS`]
//! times the rate at target; at 0% it is a quarter of it.
//!
//! ```text
//! err   = (u - target) / (1 - target)     when u > target
//!       = (u - target) / target           otherwise
//! coeff = 4 - 1 = 3                       when err >= 0
//!       = 1 - 1/4 = 0.75                  otherwise
//! rate  = (coeff * err + 1) * rate_at_target
//! ```
//!
//! Between accruals the rate at target drifts by `exp(ADJUSTMENT_SPEED * err * elapsed)`,
//! clamped to [`MIN_RATE_AT_TARGET`], [`MAX_RATE_AT_TARGET`]. The rate used for
//! accrual averages the start, the midpoint and the end of that drift.
//!
//! All intermediates are signed 256-bit values. Multiplications and divisions
//! truncate toward zero; flooring gives different results once `err` is negative.
//!
//! # Example
//!
//! ```rust
//! use morpho_rs_blue::irm::get_borrow_rate;
//! use alloy_primitives::U256;
//!
//! let result = get_borrow_rate(
//!     U256::from(559_455_285_663_861_780u64),
//!     U256::from(240_238_572u64),
//!     4490,
//! )
//! .unwrap();
//!
//! assert_eq!(result.avg_borrow_rate, U256::from(171_830_421u64));
//! assert_eq!(result.end_rate_at_target, U256::from(239_592_324u64));
//! ```

use alloy_primitives::{I256, U256};

use crate::error::Result;
use crate::market::Market;
use crate::market_params::MarketParams;
use crate::math::{
    signed_from_i128, to_signed, to_unsigned, w_div_to_zero, w_mul_to_zero, OverflowExt, WAD,
};

/// Curve steepness parameter (4.0 in WAD)
pub const CURVE_STEEPNESS: U256 = U256::from_limbs([4_000_000_000_000_000_000, 0, 0, 0]);

/// Target utilization rate (90% in WAD = 0.9)
pub const TARGET_UTILIZATION: U256 = U256::from_limbs([900_000_000_000_000_000, 0, 0, 0]);

/// Initial rate at target (4% / SECONDS_PER_YEAR)
pub const INITIAL_RATE_AT_TARGET: U256 = U256::from_limbs([1_268_391_679, 0, 0, 0]);

/// Adjustment speed (50 / SECONDS_PER_YEAR)
pub const ADJUSTMENT_SPEED: U256 = U256::from_limbs([1_585_489_599_188, 0, 0, 0]);

/// Minimum rate at target (0.1% / SECONDS_PER_YEAR)
pub const MIN_RATE_AT_TARGET: U256 = U256::from_limbs([31_709_791, 0, 0, 0]);

/// Maximum rate at target (200% / SECONDS_PER_YEAR)
pub const MAX_RATE_AT_TARGET: U256 = U256::from_limbs([63_419_583_967, 0, 0, 0]);

/// ln(2) scaled by WAD
pub const LN_2_INT: i128 = 693_147_180_559_945_309;

/// ln(1e-18) scaled by WAD (negative)
pub const LN_WEI_INT: i128 = -41_446_531_673_892_822_312;

/// Upper bound for wExp to avoid overflow
pub const WEXP_UPPER_BOUND: i128 = 93_859_467_695_000_404_319;

/// Value of wExp at upper bound
/// 57716089161558943949701069502944508345128422502756744429568
pub const WEXP_UPPER_VALUE: U256 = U256::from_limbs([0, 0, 0x31D8_1650_C7D8_8B80, 0x9]);

/// Result of borrow rate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowRateResult {
    /// Average borrow rate over the period (WAD-scaled per second), used for accrual
    pub avg_borrow_rate: U256,
    /// End borrow rate (instantaneous rate at end of period)
    pub end_borrow_rate: U256,
    /// New rate at target after the period
    pub end_rate_at_target: U256,
}

/// An interest rate model queried by the engine during accrual.
///
/// Implementations return the rate to accrue over `elapsed` seconds and the
/// rate-at-target the market should persist afterwards.
pub trait InterestRateModel {
    fn borrow_rate(
        &self,
        market_params: &MarketParams,
        market: &Market,
        elapsed: u64,
    ) -> Result<BorrowRateResult>;
}

/// The Adaptive Curve IRM, driven by the market's utilization and its
/// persisted `rate_at_target`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveCurveIrm;

impl InterestRateModel for AdaptiveCurveIrm {
    fn borrow_rate(
        &self,
        _market_params: &MarketParams,
        market: &Market,
        elapsed: u64,
    ) -> Result<BorrowRateResult> {
        get_borrow_rate(market.utilization()?, market.rate_at_target, elapsed)
    }
}

/// Approximation of exp(x) used by the Adaptive Curve IRM.
///
/// Uses the decomposition: e^x = 2^q * e^r where x = q*ln(2) + r
/// with -ln(2)/2 <= r <= ln(2)/2
///
/// ```rust
/// use morpho_rs_blue::irm::w_exp;
/// use morpho_rs_blue::math::signed_from_i128;
/// use alloy_primitives::U256;
///
/// let result = w_exp(signed_from_i128(-1_907_753_029_319_520)).unwrap();
/// assert_eq!(result, U256::from(998_094_066_731_490_918u64));
/// ```
pub fn w_exp(x: I256) -> Result<U256> {
    // If x < ln(1e-18) then exp(x) < 1e-18 so it is rounded to zero
    if x < signed_from_i128(LN_WEI_INT) {
        return Ok(U256::ZERO);
    }

    // Clip to avoid overflow
    if x >= signed_from_i128(WEXP_UPPER_BOUND) {
        return Ok(WEXP_UPPER_VALUE);
    }

    let ln_2 = signed_from_i128(LN_2_INT);
    let two = signed_from_i128(2);
    let wad = to_signed(WAD)?;

    // Decompose x as x = q * ln(2) + r
    // q = x / ln(2) rounded half toward zero
    let half_ln_2 = ln_2.checked_div(two).overflow()?;
    let rounding_adjustment = if x < I256::ZERO {
        -half_ln_2
    } else {
        half_ln_2
    };
    let q = x
        .checked_add(rounding_adjustment)
        .and_then(|shifted| shifted.checked_div(ln_2))
        .overflow()?;
    let r = q
        .checked_mul(ln_2)
        .and_then(|whole| x.checked_sub(whole))
        .overflow()?;

    // Compute e^r with a 2nd-order Taylor polynomial
    // e^r ≈ 1 + r + r²/2
    let r_squared_half = r
        .checked_mul(r)
        .and_then(|r_squared| r_squared.checked_div(wad))
        .and_then(|scaled| scaled.checked_div(two))
        .overflow()?;
    let exp_r = wad
        .checked_add(r)
        .and_then(|sum| sum.checked_add(r_squared_half))
        .overflow()?;
    let exp_r = to_unsigned(exp_r)?;

    // Return e^x = 2^q * e^r
    let shift = q.unsigned_abs().saturating_to::<usize>();
    if q >= I256::ZERO {
        Ok(exp_r << shift)
    } else {
        Ok(exp_r >> shift)
    }
}

/// Calculates the borrow rate for the Adaptive Curve IRM.
///
/// This is the core IRM function that computes both the average borrow rate
/// over the elapsed period and the adapted `rate_at_target` at its end.
///
/// # Arguments
///
/// * `utilization` - Current market utilization (WAD-scaled, 0 to 1e18)
/// * `rate_at_target` - Current rate at target utilization (per-second, WAD-scaled).
///   Pass `U256::ZERO` for first interaction (will use `INITIAL_RATE_AT_TARGET`).
/// * `elapsed` - Time since last update in seconds
///
/// # Returns
///
/// A [`BorrowRateResult`] containing:
/// - `avg_borrow_rate`: Average borrow rate over the elapsed period (for interest accrual)
/// - `end_borrow_rate`: Instantaneous rate at the end (current rate)
/// - `end_rate_at_target`: Updated rate at target after adaptation
pub fn get_borrow_rate(
    utilization: U256,
    rate_at_target: U256,
    elapsed: u64,
) -> Result<BorrowRateResult> {
    let wad = to_signed(WAD)?;
    let utilization = to_signed(utilization)?;
    let target = to_signed(TARGET_UTILIZATION)?;
    let start_rate_at_target = to_signed(rate_at_target)?;

    // Calculate error from target utilization
    let err_norm_factor = if utilization > target {
        wad.checked_sub(target).overflow()?
    } else {
        target
    };
    let err = w_div_to_zero(utilization.checked_sub(target).overflow()?, err_norm_factor)?;

    let (avg_rate_at_target, end_rate_at_target) = if start_rate_at_target == I256::ZERO {
        // First interaction
        let initial = to_signed(INITIAL_RATE_AT_TARGET)?;
        (initial, initial)
    } else {
        let speed = w_mul_to_zero(to_signed(ADJUSTMENT_SPEED)?, err)?;
        let linear_adaptation = speed
            .checked_mul(to_signed(U256::from(elapsed))?)
            .overflow()?;

        if linear_adaptation == I256::ZERO {
            (start_rate_at_target, start_rate_at_target)
        } else {
            let end_rate = new_rate_at_target(start_rate_at_target, linear_adaptation)?;
            let half_adaptation = linear_adaptation
                .checked_div(signed_from_i128(2))
                .overflow()?;
            let mid_rate = new_rate_at_target(start_rate_at_target, half_adaptation)?;

            // Trapezoidal average with the midpoint counted twice
            let avg_rate = mid_rate
                .checked_mul(signed_from_i128(2))
                .and_then(|twice_mid| twice_mid.checked_add(start_rate_at_target))
                .and_then(|sum| sum.checked_add(end_rate))
                .and_then(|sum| sum.checked_div(signed_from_i128(4)))
                .overflow()?;

            (avg_rate, end_rate)
        }
    };

    // Calculate the curve coefficient
    let coeff = if err < I256::ZERO {
        wad.checked_sub(w_div_to_zero(wad, to_signed(CURVE_STEEPNESS)?)?)
            .overflow()?
    } else {
        to_signed(CURVE_STEEPNESS)?.checked_sub(wad).overflow()?
    };

    // Apply the curve function
    let curve = |rate: I256| -> Result<U256> {
        let factor = w_mul_to_zero(coeff, err)?.checked_add(wad).overflow()?;
        to_unsigned(w_mul_to_zero(factor, rate)?)
    };

    Ok(BorrowRateResult {
        avg_borrow_rate: curve(avg_rate_at_target)?,
        end_borrow_rate: curve(end_rate_at_target)?,
        end_rate_at_target: to_unsigned(end_rate_at_target)?,
    })
}

/// `start * e^adaptation`, bounded to the allowed rate-at-target range.
fn new_rate_at_target(start_rate_at_target: I256, linear_adaptation: I256) -> Result<I256> {
    let min_rate = to_signed(MIN_RATE_AT_TARGET)?;
    let max_rate = to_signed(MAX_RATE_AT_TARGET)?;
    let rate = w_mul_to_zero(start_rate_at_target, to_signed(w_exp(linear_adaptation)?)?)?;

    if rate < min_rate {
        Ok(min_rate)
    } else if rate > max_rate {
        Ok(max_rate)
    } else {
        Ok(rate)
    }
}
