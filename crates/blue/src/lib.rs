//! Morpho Blue Accounting Engine
//!
//! This crate reproduces, off-chain and bit-for-bit, the accounting of
//! Morpho Blue markets: interest accrual under the Adaptive Curve IRM,
//! share-based supply and borrow positions, collateral, health checks and
//! liquidations.
//!
//! # Overview
//!
//! The engine allows you to:
//! - Derive market identifiers and validate market parameters
//! - Create markets with owner-enabled IRMs and LLTVs
//! - Supply, withdraw, borrow and repay with the protocol's rounding
//! - Move collateral and check position health at a given price
//! - Liquidate unhealthy positions and realize bad debt
//! - Preview balances after accrual without committing anything
//!
//! The engine is deterministic: it never reads a clock or an oracle. The
//! current timestamp and the collateral price are arguments of every call
//! that needs them, and all state lives behind the [`Storage`] port.
//!
//! # Example
//!
//! ```rust
//! use morpho_rs_blue::{MarketParams, Morpho, MorphoError, WAD};
//! use alloy_primitives::{address, U256};
//!
//! let owner = address!("0x1000000000000000000000000000000000000001");
//! let user = address!("0x2000000000000000000000000000000000000002");
//! let params = MarketParams {
//!     loan_token: address!("0xa000000000000000000000000000000000000001"),
//!     collateral_token: address!("0xa000000000000000000000000000000000000002"),
//!     oracle: address!("0xa000000000000000000000000000000000000003"),
//!     irm: address!("0xa000000000000000000000000000000000000004"),
//!     lltv: U256::from(860_000_000_000_000_000u64),
//! };
//!
//! let mut morpho = Morpho::new(owner, owner);
//! morpho.enable_irm(owner, params.irm)?;
//! morpho.enable_lltv(owner, params.lltv)?;
//! morpho.create_market(owner, &params, 1_700_000_000)?;
//!
//! let (_, shares) = morpho.supply(user, &params, U256::from(10) * WAD, U256::ZERO, user, 1_700_000_000)?;
//! assert!(shares > U256::ZERO);
//!
//! // Creating the same market twice fails
//! assert_eq!(
//!     morpho.create_market(owner, &params, 1_700_000_000),
//!     Err(MorphoError::MarketAlreadyCreated)
//! );
//! # Ok::<(), MorphoError>(())
//! ```

pub mod config;
pub mod error;
pub mod irm;
pub mod market;
pub mod market_params;
pub mod math;
pub mod morpho;
pub mod position;
pub mod shares;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigError, MorphoConfig};
pub use error::{MorphoError, Result};

// Market exports
pub use market::{
    get_liquidation_incentive_factor, get_utilization, Accrual, Market, MAX_FEE,
    MAX_LIQUIDATION_INCENTIVE_FACTOR,
};
pub use market_params::{compute_market_id, validate_market_params, MarketId, MarketParams};
pub use position::Position;

// IRM exports
pub use irm::{get_borrow_rate, w_exp, AdaptiveCurveIrm, BorrowRateResult, InterestRateModel};

// Engine exports
pub use morpho::Morpho;
pub use storage::{InMemoryStorage, Storage};

// Math exports
pub use math::{RoundingDirection, SECONDS_PER_YEAR, WAD};
pub use shares::{assets_to_shares, shares_to_assets, VIRTUAL_ASSETS, VIRTUAL_SHARES};
