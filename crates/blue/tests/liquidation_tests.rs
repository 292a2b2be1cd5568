//! Liquidation and bad debt tests.

mod helpers;

use alloy_primitives::U256;
use helpers::{setup, BORROWER, LIQUIDATOR, LLTV_80, SUPPLIER};
use morpho_rs_blue::{
    get_liquidation_incentive_factor, MarketId, MarketParams, Morpho, MorphoError, WAD,
};

fn wad(units: u64) -> U256 {
    U256::from(units) * WAD
}

/// 1000 supplied, 100 collateral and 80 borrowed at a 1:1 price.
fn setup_borrowed() -> (Morpho, MarketParams, MarketId) {
    let (mut morpho, params, id) = setup();
    morpho
        .supply(SUPPLIER, &params, wad(1_000), U256::ZERO, SUPPLIER, 0)
        .unwrap();
    morpho
        .supply_collateral(BORROWER, &params, wad(100), BORROWER, 0)
        .unwrap();
    morpho
        .borrow(BORROWER, &params, wad(80), U256::ZERO, BORROWER, BORROWER, WAD, 0)
        .unwrap();
    (morpho, params, id)
}

#[test]
fn test_liquidation_incentive_factor() {
    assert_eq!(
        get_liquidation_incentive_factor(LLTV_80).unwrap(),
        U256::from(1_063_829_787_234_042_553u128)
    );
}

#[test]
fn test_liquidate_healthy_position() {
    let (mut morpho, params, _) = setup_borrowed();

    assert_eq!(
        morpho.liquidate(LIQUIDATOR, &params, BORROWER, wad(1), U256::ZERO, WAD, 0),
        Err(MorphoError::HealthyPosition)
    );
    assert_eq!(
        morpho.liquidate(LIQUIDATOR, &params, BORROWER, U256::ZERO, U256::ZERO, WAD, 0),
        Err(MorphoError::ZeroAssets)
    );
    assert_eq!(
        morpho.liquidate(LIQUIDATOR, &params, BORROWER, wad(1), U256::from(1), WAD, 0),
        Err(MorphoError::InconsistentInput)
    );
}

#[test]
fn test_partial_liquidation_by_repaid_shares() {
    let (mut morpho, params, id) = setup_borrowed();
    let price = U256::from(900_000_000_000_000_000u64);
    let repaid_shares = U256::from(40_000_000_000_000_000_000_000_000u128);

    let (seized, repaid) = morpho
        .liquidate(LIQUIDATOR, &params, BORROWER, U256::ZERO, repaid_shares, price, 0)
        .unwrap();
    assert_eq!(seized, U256::from(47_281_323_877_068_557_911u128));
    assert_eq!(repaid, wad(40));

    let position = morpho.position(&id, &BORROWER);
    assert_eq!(position.collateral, wad(100) - seized);
    assert_eq!(position.borrow_shares, repaid_shares);

    let market = morpho.market(&id).unwrap();
    assert_eq!(market.total_borrow_assets, wad(40));
    assert_eq!(market.total_borrow_shares, repaid_shares);
    // No bad debt, suppliers keep everything
    assert_eq!(market.total_supply_assets, wad(1_000));
}

#[test]
fn test_liquidation_realizes_bad_debt() {
    let (mut morpho, params, id) = setup_borrowed();
    let price = WAD / U256::from(2);

    let (seized, repaid) = morpho
        .liquidate(LIQUIDATOR, &params, BORROWER, wad(100), U256::ZERO, price, 0)
        .unwrap();
    assert_eq!(seized, wad(100));
    assert_eq!(repaid, U256::from(47_000_000_000_000_000_009u128));

    let position = morpho.position(&id, &BORROWER);
    assert_eq!(position.collateral, U256::ZERO);
    assert_eq!(position.borrow_shares, U256::ZERO);

    // The 32.99 remaining debt is written off against the suppliers
    let market = morpho.market(&id).unwrap();
    assert_eq!(market.total_borrow_assets, U256::ZERO);
    assert_eq!(market.total_borrow_shares, U256::ZERO);
    assert_eq!(
        market.total_supply_assets,
        U256::from(967_000_000_000_000_000_009u128)
    );
    assert_eq!(
        wad(1_000) - market.total_supply_assets,
        U256::from(32_999_999_999_999_999_991u128)
    );
}

#[test]
fn test_seizing_more_than_the_collateral() {
    let (mut morpho, params, id) = setup_borrowed();
    let before = morpho.storage().clone();

    assert_eq!(
        morpho.liquidate(
            LIQUIDATOR,
            &params,
            BORROWER,
            wad(101),
            U256::ZERO,
            WAD / U256::from(2),
            0
        ),
        Err(MorphoError::Uint256Overflow)
    );
    assert_eq!(morpho.storage(), &before);
    assert_eq!(morpho.position(&id, &BORROWER).collateral, wad(100));
}
