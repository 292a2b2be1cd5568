//! Shared fixtures for the engine integration tests.

use alloy_primitives::{address, Address, U256};
use morpho_rs_blue::{
    BorrowRateResult, InMemoryStorage, InterestRateModel, Market, MarketId, MarketParams,
    Morpho, MorphoConfig, Result,
};

pub const OWNER: Address = address!("0x1234567890123456789012345678901234567890");
pub const FEE_RECIPIENT: Address = address!("0x0987654321098765432109876543210987654321");
pub const SUPPLIER: Address = address!("0x5555555555555555555555555555555555555555");
pub const BORROWER: Address = address!("0x6666666666666666666666666666666666666666");
pub const LIQUIDATOR: Address = address!("0x7777777777777777777777777777777777777777");

/// 80% LLTV
pub const LLTV_80: U256 = U256::from_limbs([800_000_000_000_000_000, 0, 0, 0]);

/// Reports the same rate regardless of market state.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateIrm(pub U256);

impl InterestRateModel for FixedRateIrm {
    fn borrow_rate(
        &self,
        _market_params: &MarketParams,
        market: &Market,
        _elapsed: u64,
    ) -> Result<BorrowRateResult> {
        Ok(BorrowRateResult {
            avg_borrow_rate: self.0,
            end_borrow_rate: self.0,
            end_rate_at_target: market.rate_at_target,
        })
    }
}

pub fn market_params() -> MarketParams {
    MarketParams {
        loan_token: address!("0x3333333333333333333333333333333333333333"),
        collateral_token: address!("0x4444444444444444444444444444444444444444"),
        oracle: address!("0x2222222222222222222222222222222222222222"),
        irm: address!("0x1111111111111111111111111111111111111111"),
        lltv: LLTV_80,
    }
}

/// An engine with IRM and LLTV enabled and a market created at timestamp 0.
pub fn setup_with_irm<I: InterestRateModel>(
    irm: I,
) -> (Morpho<InMemoryStorage, I>, MarketParams, MarketId) {
    let config = MorphoConfig::new(OWNER).with_fee_recipient(FEE_RECIPIENT);
    let mut morpho = Morpho::with_parts(config, InMemoryStorage::new(), irm);
    let params = market_params();

    morpho.enable_irm(OWNER, params.irm).unwrap();
    morpho.enable_lltv(OWNER, params.lltv).unwrap();
    let id = morpho.create_market(OWNER, &params, 0).unwrap();

    (morpho, params, id)
}

pub fn setup() -> (Morpho, MarketParams, MarketId) {
    let config = MorphoConfig::new(OWNER).with_fee_recipient(FEE_RECIPIENT);
    let mut morpho = Morpho::from_config(config);
    let params = market_params();

    morpho.enable_irm(OWNER, params.irm).unwrap();
    morpho.enable_lltv(OWNER, params.lltv).unwrap();
    let id = morpho.create_market(OWNER, &params, 0).unwrap();

    (morpho, params, id)
}
