//! Per-account positions in a market.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::market::Market;
use crate::math::RoundingDirection;

/// An account's holdings in one market. Created lazily as all-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Amount of supply shares held
    pub supply_shares: U256,
    /// Amount of borrow shares held
    pub borrow_shares: U256,
    /// Amount of collateral assets held
    pub collateral: U256,
}

impl Position {
    /// Returns the supply assets for this position
    pub fn supply_assets(&self, market: &Market) -> Result<U256> {
        market.to_supply_assets(self.supply_shares, RoundingDirection::Down)
    }

    /// Returns the borrow assets for this position
    pub fn borrow_assets(&self, market: &Market) -> Result<U256> {
        market.to_borrow_assets(self.borrow_shares, RoundingDirection::Up)
    }
}
