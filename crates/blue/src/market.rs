//! Market state and the pure accounting performed on it.
//!
//! This module implements the [`Market`] record and the functions that
//! advance it: interest accrual, share conversions, utilization, and the
//! solvency and liquidation math the engine runs against positions.
//!
//! # Overview
//!
//! A market pairs one loan token with one collateral token. Lenders and
//! borrowers hold shares of the two pools; interest grows the asset totals
//! while share totals only move on deposits, repayments and fee minting.
//!
//! Every function here is value-in/value-out. The engine in
//! [`crate::morpho`] decides when to call them and what to commit.
//!
//! # Example
//!
//! ```rust
//! use morpho_rs_blue::{AdaptiveCurveIrm, Market, MarketParams, WAD};
//! use alloy_primitives::U256;
//!
//! let market = Market {
//!     total_supply_assets: U256::from(1_000_000) * WAD,
//!     total_supply_shares: U256::from(1_000_000) * WAD,
//!     total_borrow_assets: U256::from(800_000) * WAD,
//!     total_borrow_shares: U256::from(800_000) * WAD,
//!     last_update: 1000,
//!     ..Market::default()
//! };
//!
//! // Accrue 1 day of interest
//! let accrual = market
//!     .accrue_interest(&MarketParams::default(), &AdaptiveCurveIrm, 1000 + 86_400)
//!     .unwrap();
//!
//! // Both supply and borrow increased by the same interest amount
//! assert_eq!(
//!     accrual.market.total_supply_assets - market.total_supply_assets,
//!     accrual.interest
//! );
//! assert_eq!(
//!     accrual.market.total_borrow_assets - market.total_borrow_assets,
//!     accrual.interest
//! );
//! ```

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{MorphoError, Result};
use crate::irm::InterestRateModel;
use crate::market_params::MarketParams;
use crate::math::{
    self, checked_add, checked_sub, mul_div_down, mul_div_up, w_div_down, w_div_up, w_mul_down,
    w_mul_up, w_taylor_compounded, RoundingDirection, WAD,
};
use crate::position::Position;
use crate::shares::{assets_to_shares, shares_to_assets};

/// Liquidation cursor used to calculate the liquidation incentive (30%)
pub const LIQUIDATION_CURSOR: U256 = U256::from_limbs([300_000_000_000_000_000, 0, 0, 0]);

/// Maximum liquidation incentive factor (115%)
pub const MAX_LIQUIDATION_INCENTIVE_FACTOR: U256 =
    U256::from_limbs([1_150_000_000_000_000_000, 0, 0, 0]);

/// Scale of the collateral prices passed to the engine (collateral/loan, 1e18)
pub const ORACLE_PRICE_SCALE: U256 = WAD;

/// Maximum protocol fee (25%)
pub const MAX_FEE: U256 = U256::from_limbs([250_000_000_000_000_000, 0, 0, 0]);

/// The accounting record of a lending market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// The amount of loan assets supplied in total on the market
    pub total_supply_assets: U256,

    /// The total supply shares representing lender positions
    pub total_supply_shares: U256,

    /// The amount of loan assets borrowed in total from the market
    pub total_borrow_assets: U256,

    /// The total borrow shares representing borrower debt
    pub total_borrow_shares: U256,

    /// The timestamp (in seconds) when interest was last accrued
    pub last_update: u64,

    /// The protocol fee percentage (WAD-scaled, e.g., 0.1 WAD = 10%)
    pub fee: U256,

    /// The adaptive IRM's rate at target utilization, zero until the IRM first runs
    pub rate_at_target: U256,
}

/// Outcome of accruing interest on a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// The market after accrual
    pub market: Market,
    /// Average borrow rate applied over the period
    pub borrow_rate: U256,
    /// Total interest accrued
    pub interest: U256,
    /// Supply shares minted to the fee recipient
    pub fee_shares: U256,
}

/// Interest and fee split for one accrual period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccruedInterest {
    /// Total interest accrued
    pub interest: U256,
    /// Fee shares minted to the protocol
    pub fee_shares: U256,
}

impl Market {
    /// A freshly created market: all totals zero, last updated at `timestamp`.
    pub fn created_at(timestamp: u64) -> Self {
        Self {
            last_update: timestamp,
            ..Self::default()
        }
    }

    /// Returns the market's utilization rate (WAD-scaled)
    pub fn utilization(&self) -> Result<U256> {
        get_utilization(self.total_supply_assets, self.total_borrow_assets)
    }

    /// Convert supply shares to assets
    pub fn to_supply_assets(&self, shares: U256, rounding: RoundingDirection) -> Result<U256> {
        shares_to_assets(
            shares,
            self.total_supply_assets,
            self.total_supply_shares,
            rounding,
        )
    }

    /// Convert assets to supply shares
    pub fn to_supply_shares(&self, assets: U256, rounding: RoundingDirection) -> Result<U256> {
        assets_to_shares(
            assets,
            self.total_supply_assets,
            self.total_supply_shares,
            rounding,
        )
    }

    /// Convert borrow shares to assets
    pub fn to_borrow_assets(&self, shares: U256, rounding: RoundingDirection) -> Result<U256> {
        shares_to_assets(
            shares,
            self.total_borrow_assets,
            self.total_borrow_shares,
            rounding,
        )
    }

    /// Convert assets to borrow shares
    pub fn to_borrow_shares(&self, assets: U256, rounding: RoundingDirection) -> Result<U256> {
        assets_to_shares(
            assets,
            self.total_borrow_assets,
            self.total_borrow_shares,
            rounding,
        )
    }

    /// Accrues interest on the market up to the given timestamp.
    ///
    /// # How Interest Accrual Works
    ///
    /// 1. Calculate elapsed time since `last_update`; nothing changes if it is zero
    /// 2. If anything is borrowed, ask the IRM for the average rate over the period
    /// 3. Calculate interest: `total_borrow * (e^(rate * time) - 1)` (Taylor approximation)
    /// 4. Add interest to both `total_supply_assets` and `total_borrow_assets`
    /// 5. Mint fee shares: `fee_amount * shares / (total_assets - fee_amount)`
    /// 6. Persist the IRM's new `rate_at_target`
    ///
    /// The original market is unchanged; the caller credits
    /// [`Accrual::fee_shares`] to the fee recipient.
    ///
    /// # Errors
    ///
    /// - [`MorphoError::InvalidInterestAccrual`] if `timestamp < last_update`
    /// - arithmetic errors from the IRM or the conversions
    pub fn accrue_interest<I>(
        &self,
        market_params: &MarketParams,
        irm: &I,
        timestamp: u64,
    ) -> Result<Accrual>
    where
        I: InterestRateModel + ?Sized,
    {
        let elapsed = self.elapsed_until(timestamp)?;

        let unchanged = Accrual {
            market: *self,
            borrow_rate: U256::ZERO,
            interest: U256::ZERO,
            fee_shares: U256::ZERO,
        };

        if elapsed == 0 {
            return Ok(unchanged);
        }

        if self.total_borrow_assets.is_zero() {
            return Ok(Accrual {
                market: Market {
                    last_update: timestamp,
                    ..*self
                },
                ..unchanged
            });
        }

        let rate = irm.borrow_rate(market_params, self, elapsed)?;

        let AccruedInterest {
            interest,
            fee_shares,
        } = get_accrued_interest(
            rate.avg_borrow_rate,
            self.total_supply_assets,
            self.total_borrow_assets,
            self.total_supply_shares,
            self.fee,
            elapsed,
        )?;

        Ok(Accrual {
            market: Market {
                total_supply_assets: checked_add(self.total_supply_assets, interest)?,
                total_supply_shares: checked_add(self.total_supply_shares, fee_shares)?,
                total_borrow_assets: checked_add(self.total_borrow_assets, interest)?,
                total_borrow_shares: self.total_borrow_shares,
                last_update: timestamp,
                fee: self.fee,
                rate_at_target: rate.end_rate_at_target,
            },
            borrow_rate: rate.avg_borrow_rate,
            interest,
            fee_shares,
        })
    }

    fn elapsed_until(&self, timestamp: u64) -> Result<u64> {
        timestamp
            .checked_sub(self.last_update)
            .ok_or(MorphoError::InvalidInterestAccrual {
                timestamp,
                last_update: self.last_update,
            })
    }

    /// Returns the supply rate paid to lenders for a given borrow rate.
    ///
    /// Supply rate = borrow_rate * utilization * (1 - fee)
    pub fn get_supply_rate(&self, borrow_rate: U256) -> Result<U256> {
        get_supply_rate(borrow_rate, self.utilization()?, self.fee)
    }

    // ==================== Solvency ====================

    /// Returns the maximum debt a position may carry against its collateral
    pub fn get_max_borrow_assets(&self, collateral: U256, lltv: U256, price: U256) -> Result<U256> {
        w_mul_down(get_collateral_value(collateral, price)?, lltv)
    }

    /// Checks whether a position is healthy at the given collateral price.
    ///
    /// A position without debt is always healthy. Otherwise the debt, rounded
    /// up, must not exceed the collateral value times the LLTV, rounded down.
    pub fn is_healthy(&self, position: &Position, lltv: U256, price: U256) -> Result<bool> {
        if position.borrow_shares.is_zero() {
            return Ok(true);
        }

        let borrowed = self.to_borrow_assets(position.borrow_shares, RoundingDirection::Up)?;
        let max_borrow = self.get_max_borrow_assets(position.collateral, lltv, price)?;

        Ok(borrowed <= max_borrow)
    }

    // ==================== Liquidation Calculations ====================

    /// Borrow shares a liquidator repays to seize `seized_assets` of collateral
    pub fn get_liquidation_repaid_shares(
        &self,
        seized_assets: U256,
        lltv: U256,
        price: U256,
    ) -> Result<U256> {
        let seized_value = mul_div_up(seized_assets, price, ORACLE_PRICE_SCALE)?;
        let repaid_assets = w_div_up(seized_value, get_liquidation_incentive_factor(lltv)?)?;
        self.to_borrow_shares(repaid_assets, RoundingDirection::Up)
    }

    /// Collateral seized when a liquidator repays `repaid_shares` of debt
    pub fn get_liquidation_seized_assets(
        &self,
        repaid_shares: U256,
        lltv: U256,
        price: U256,
    ) -> Result<U256> {
        let repaid_assets = self.to_borrow_assets(repaid_shares, RoundingDirection::Down)?;
        let value_with_incentive =
            w_mul_down(repaid_assets, get_liquidation_incentive_factor(lltv)?)?;
        mul_div_down(value_with_incentive, ORACLE_PRICE_SCALE, price)
    }
}

// ==================== Utility Functions ====================

/// Calculate the utilization rate (WAD-scaled).
///
/// An empty market with outstanding borrows reports `U256::MAX`.
pub fn get_utilization(total_supply_assets: U256, total_borrow_assets: U256) -> Result<U256> {
    if total_supply_assets.is_zero() {
        if total_borrow_assets > U256::ZERO {
            return Ok(U256::MAX);
        }
        return Ok(U256::ZERO);
    }
    w_div_down(total_borrow_assets, total_supply_assets)
}

/// Calculate the supply rate from a borrow rate, both rounded up
pub fn get_supply_rate(borrow_rate: U256, utilization: U256, fee: U256) -> Result<U256> {
    let borrow_rate_without_fee = w_mul_up(borrow_rate, utilization)?;
    w_mul_up(borrow_rate_without_fee, checked_sub(WAD, fee)?)
}

/// Returns the value of collateral in loan assets
pub fn get_collateral_value(collateral: U256, price: U256) -> Result<U256> {
    mul_div_down(collateral, price, ORACLE_PRICE_SCALE)
}

/// Calculate the interest accrued on a market
pub fn get_accrued_interest(
    borrow_rate: U256,
    total_supply_assets: U256,
    total_borrow_assets: U256,
    total_supply_shares: U256,
    fee: U256,
    elapsed: u64,
) -> Result<AccruedInterest> {
    let interest = w_mul_down(
        total_borrow_assets,
        w_taylor_compounded(borrow_rate, U256::from(elapsed))?,
    )?;

    let fee_amount = w_mul_down(interest, fee)?;

    // Fee shares are priced against the post-interest supply minus the fee itself
    let fee_shares = assets_to_shares(
        fee_amount,
        checked_sub(checked_add(total_supply_assets, interest)?, fee_amount)?,
        total_supply_shares,
        RoundingDirection::Down,
    )?;

    Ok(AccruedInterest {
        interest,
        fee_shares,
    })
}

/// Calculate the liquidation incentive factor
pub fn get_liquidation_incentive_factor(lltv: U256) -> Result<U256> {
    let discount = w_mul_down(LIQUIDATION_CURSOR, checked_sub(WAD, lltv)?)?;
    Ok(math::min(
        MAX_LIQUIDATION_INCENTIVE_FACTOR,
        w_div_down(WAD, checked_sub(WAD, discount)?)?,
    ))
}
