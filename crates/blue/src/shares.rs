//! Asset/share conversions with virtual offsets.
//!
//! Both sides of every ratio get a small virtual amount added, so an empty
//! market converts at `1 asset = 1e6 shares` instead of dividing by zero, and a
//! first depositor cannot inflate the share price cheaply.

use alloy_primitives::U256;

use crate::error::Result;
use crate::math::{checked_add, mul_div, RoundingDirection};

/// Virtual shares added to the total shares of every market (1e6)
pub const VIRTUAL_SHARES: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// Virtual assets added to the total assets of every market (1)
pub const VIRTUAL_ASSETS: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Converts assets to shares.
///
/// ```text
/// shares = assets * (total_shares + VIRTUAL_SHARES) / (total_assets + VIRTUAL_ASSETS)
/// ```
pub fn assets_to_shares(
    assets: U256,
    total_assets: U256,
    total_shares: U256,
    rounding: RoundingDirection,
) -> Result<U256> {
    mul_div(
        assets,
        checked_add(total_shares, VIRTUAL_SHARES)?,
        checked_add(total_assets, VIRTUAL_ASSETS)?,
        rounding,
    )
}

/// Converts shares to assets.
///
/// ```text
/// assets = shares * (total_assets + VIRTUAL_ASSETS) / (total_shares + VIRTUAL_SHARES)
/// ```
pub fn shares_to_assets(
    shares: U256,
    total_assets: U256,
    total_shares: U256,
    rounding: RoundingDirection,
) -> Result<U256> {
    mul_div(
        shares,
        checked_add(total_assets, VIRTUAL_ASSETS)?,
        checked_add(total_shares, VIRTUAL_SHARES)?,
        rounding,
    )
}
