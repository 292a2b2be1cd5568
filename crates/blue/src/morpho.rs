//! The accounting engine.
//!
//! [`Morpho`] owns the administration state (owner, fee recipient), an
//! injected [`Storage`] and an [`InterestRateModel`]. Every mutating market
//! operation follows the same sequence:
//!
//! 1. reject malformed input before reading any state
//! 2. check permissions
//! 3. load the market (`MarketNotCreated` if absent) and accrue interest
//! 4. convert assets and shares with the operation's rounding direction
//! 5. run the post-checks (health, liquidity)
//! 6. commit every touched record through the storage port
//!
//! Steps 3 to 5 work on a staged copy, so a failing call writes nothing.
//!
//! # Example
//!
//! ```rust
//! use morpho_rs_blue::{Morpho, MarketParams, WAD};
//! use alloy_primitives::{address, U256};
//!
//! let owner = address!("0x1000000000000000000000000000000000000001");
//! let lender = address!("0x2000000000000000000000000000000000000002");
//! let borrower = address!("0x3000000000000000000000000000000000000003");
//!
//! let params = MarketParams {
//!     loan_token: address!("0xa000000000000000000000000000000000000001"),
//!     collateral_token: address!("0xa000000000000000000000000000000000000002"),
//!     oracle: address!("0xa000000000000000000000000000000000000003"),
//!     irm: address!("0xa000000000000000000000000000000000000004"),
//!     lltv: U256::from(800_000_000_000_000_000u64),
//! };
//!
//! let mut morpho = Morpho::new(owner, owner);
//! morpho.enable_irm(owner, params.irm).unwrap();
//! morpho.enable_lltv(owner, params.lltv).unwrap();
//! let id = morpho.create_market(owner, &params, 0).unwrap();
//!
//! morpho.supply(lender, &params, U256::from(1_000) * WAD, U256::ZERO, lender, 0).unwrap();
//! morpho.supply_collateral(borrower, &params, U256::from(100) * WAD, borrower, 0).unwrap();
//! morpho
//!     .borrow(borrower, &params, U256::from(80) * WAD, U256::ZERO, borrower, borrower, WAD, 0)
//!     .unwrap();
//!
//! assert!(morpho.is_healthy(&params, &id, &borrower, WAD).unwrap());
//! ```

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use tracing::{debug, trace};

use crate::config::MorphoConfig;
use crate::error::{MorphoError, Result};
use crate::irm::{AdaptiveCurveIrm, InterestRateModel};
use crate::market::{Market, MAX_FEE};
use crate::market_params::{validate_market_params, MarketId, MarketParams};
use crate::math::{checked_add, checked_sub, min, zero_floor_sub, RoundingDirection, WAD};
use crate::position::Position;
use crate::storage::{InMemoryStorage, Storage};

/// The lending protocol's accounting engine.
#[derive(Debug, Clone)]
pub struct Morpho<S = InMemoryStorage, I = AdaptiveCurveIrm> {
    owner: Address,
    fee_recipient: Address,
    storage: S,
    irm: I,
}

/// Records touched by one operation, committed together once every check passed.
#[derive(Debug)]
struct MarketUpdate {
    id: MarketId,
    market: Market,
    positions: BTreeMap<Address, Position>,
}

impl MarketUpdate {
    fn new(id: MarketId, market: Market) -> Self {
        Self {
            id,
            market,
            positions: BTreeMap::new(),
        }
    }

    /// The staged position of `account`, falling back to storage.
    fn position<S: Storage + ?Sized>(&self, storage: &S, account: &Address) -> Position {
        self.positions
            .get(account)
            .copied()
            .unwrap_or_else(|| storage.position_or_default(&self.id, account))
    }

    fn set_position(&mut self, account: Address, position: Position) {
        self.positions.insert(account, position);
    }

    fn commit<S: Storage + ?Sized>(self, storage: &mut S) {
        storage.set_market(self.id, self.market);
        for (account, position) in self.positions {
            storage.set_position(self.id, account, position);
        }
    }
}

/// Exactly one of two amounts must be set.
fn exactly_one_nonzero(x: U256, y: U256) -> Result<()> {
    match (x.is_zero(), y.is_zero()) {
        (true, true) => Err(MorphoError::ZeroAssets),
        (false, false) => Err(MorphoError::InconsistentInput),
        _ => Ok(()),
    }
}

fn non_zero_address(address: Address) -> Result<()> {
    if address.is_zero() {
        return Err(MorphoError::ZeroAddress);
    }
    Ok(())
}

impl Morpho {
    /// Creates an engine backed by [`InMemoryStorage`] and the [`AdaptiveCurveIrm`].
    pub fn new(owner: Address, fee_recipient: Address) -> Self {
        Self::with_parts(
            MorphoConfig::new(owner).with_fee_recipient(fee_recipient),
            InMemoryStorage::new(),
            AdaptiveCurveIrm,
        )
    }

    /// Creates an engine from a configuration with the default storage and IRM.
    pub fn from_config(config: MorphoConfig) -> Self {
        Self::with_parts(config, InMemoryStorage::new(), AdaptiveCurveIrm)
    }
}

impl<S: Storage, I: InterestRateModel> Morpho<S, I> {
    /// Creates an engine over the given storage and interest rate model.
    pub fn with_parts(config: MorphoConfig, storage: S, irm: I) -> Self {
        Self {
            owner: config.owner,
            fee_recipient: config.fee_recipient,
            storage,
            irm,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn irm(&self) -> &I {
        &self.irm
    }

    /// Consumes the engine, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn only_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(MorphoError::NotOwner);
        }
        Ok(())
    }

    /// Whether `caller` may manage the positions of `on_behalf`.
    pub fn is_sender_authorized(&self, caller: Address, on_behalf: Address) -> bool {
        caller == on_behalf || self.storage.is_authorized(&on_behalf, &caller)
    }

    fn authorized(&self, caller: Address, on_behalf: Address) -> Result<()> {
        if !self.is_sender_authorized(caller, on_behalf) {
            return Err(MorphoError::Unauthorized);
        }
        Ok(())
    }

    // ==================== Administration ====================

    /// Transfers ownership.
    ///
    /// # Errors
    ///
    /// `NotOwner` unless called by the owner, `AlreadySet` if unchanged.
    pub fn set_owner(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.only_owner(caller)?;
        if new_owner == self.owner {
            return Err(MorphoError::AlreadySet);
        }

        self.owner = new_owner;
        debug!(owner = %new_owner, "set owner");
        Ok(())
    }

    /// Changes the account credited with fee shares.
    ///
    /// Fees already accrued stay with the previous recipient.
    pub fn set_fee_recipient(&mut self, caller: Address, new_fee_recipient: Address) -> Result<()> {
        self.only_owner(caller)?;
        if new_fee_recipient == self.fee_recipient {
            return Err(MorphoError::AlreadySet);
        }

        self.fee_recipient = new_fee_recipient;
        debug!(fee_recipient = %new_fee_recipient, "set fee recipient");
        Ok(())
    }

    /// Adds `irm` to the set of IRMs markets may be created with.
    pub fn enable_irm(&mut self, caller: Address, irm: Address) -> Result<()> {
        self.only_owner(caller)?;
        if self.storage.is_irm_enabled(&irm) {
            return Err(MorphoError::AlreadySet);
        }

        self.storage.enable_irm(irm);
        debug!(%irm, "enable IRM");
        Ok(())
    }

    /// Adds `lltv` to the set of LLTVs markets may be created with.
    ///
    /// # Errors
    ///
    /// `NotOwner`, `AlreadySet`, or `MaxLltvExceeded` if `lltv >= WAD`.
    pub fn enable_lltv(&mut self, caller: Address, lltv: U256) -> Result<()> {
        self.only_owner(caller)?;
        if self.storage.is_lltv_enabled(&lltv) {
            return Err(MorphoError::AlreadySet);
        }
        if lltv >= WAD {
            return Err(MorphoError::MaxLltvExceeded);
        }

        self.storage.enable_lltv(lltv);
        debug!(%lltv, "enable LLTV");
        Ok(())
    }

    /// Sets the protocol fee of a market, accruing interest at the old fee first.
    ///
    /// # Errors
    ///
    /// `NotOwner`, `MarketNotCreated`, `AlreadySet` if unchanged,
    /// `MaxFeeExceeded` above 25%.
    pub fn set_fee(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        new_fee: U256,
        now: u64,
    ) -> Result<()> {
        self.only_owner(caller)?;
        let current = self.load_market(&market_params.id())?;
        if new_fee == current.fee {
            return Err(MorphoError::AlreadySet);
        }
        if new_fee > MAX_FEE {
            return Err(MorphoError::MaxFeeExceeded);
        }

        let mut update = self.begin(market_params, now)?;
        update.market.fee = new_fee;

        debug!(id = %update.id, fee = %new_fee, "set fee");
        update.commit(&mut self.storage);
        Ok(())
    }

    /// Lets `authorized` manage the caller's positions, or revokes it.
    pub fn set_authorization(
        &mut self,
        caller: Address,
        authorized: Address,
        new_is_authorized: bool,
    ) -> Result<()> {
        if self.storage.is_authorized(&caller, &authorized) == new_is_authorized {
            return Err(MorphoError::AlreadySet);
        }

        self.storage
            .set_authorized(caller, authorized, new_is_authorized);
        debug!(authorizer = %caller, %authorized, new_is_authorized, "set authorization");
        Ok(())
    }

    /// Creates a market. Anyone may create one with an enabled IRM and LLTV.
    ///
    /// Returns the id of the new market.
    ///
    /// # Errors
    ///
    /// - `ZeroAddress` / `InconsistentInput` for invalid parameters
    /// - `IrmNotEnabled` / `LltvNotEnabled`
    /// - `MarketAlreadyCreated` if a market with the same id exists
    pub fn create_market(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        now: u64,
    ) -> Result<MarketId> {
        validate_market_params(market_params)?;
        if !self.storage.is_irm_enabled(&market_params.irm) {
            return Err(MorphoError::IrmNotEnabled);
        }
        if !self.storage.is_lltv_enabled(&market_params.lltv) {
            return Err(MorphoError::LltvNotEnabled);
        }

        let id = market_params.id();
        if self.storage.market(&id).is_some() {
            return Err(MorphoError::MarketAlreadyCreated);
        }

        self.storage.set_market(id, Market::created_at(now));
        self.storage.set_market_params(id, *market_params);

        debug!(%id, %caller, lltv = %market_params.lltv, "create market");
        Ok(id)
    }

    // ==================== Accrual ====================

    fn load_market(&self, id: &MarketId) -> Result<Market> {
        self.storage.market(id).ok_or(MorphoError::MarketNotCreated)
    }

    /// Loads a market, accrues it to `now` and stages the fee recipient's shares.
    fn begin(&self, market_params: &MarketParams, now: u64) -> Result<MarketUpdate> {
        let id = market_params.id();
        let market = self.load_market(&id)?;
        let accrual = market.accrue_interest(market_params, &self.irm, now)?;

        let mut update = MarketUpdate::new(id, accrual.market);
        if !accrual.fee_shares.is_zero() {
            let mut position = update.position(&self.storage, &self.fee_recipient);
            position.supply_shares = checked_add(position.supply_shares, accrual.fee_shares)?;
            update.set_position(self.fee_recipient, position);
        }

        if !accrual.interest.is_zero() {
            trace!(
                %id,
                borrow_rate = %accrual.borrow_rate,
                interest = %accrual.interest,
                fee_shares = %accrual.fee_shares,
                "accrue interest"
            );
        }

        Ok(update)
    }

    /// Accrues interest on a market up to `now` and commits it.
    pub fn accrue_interest(&mut self, market_params: &MarketParams, now: u64) -> Result<()> {
        let update = self.begin(market_params, now)?;
        update.commit(&mut self.storage);
        Ok(())
    }

    // ==================== Supply Side ====================

    /// Supplies loan assets on behalf of `on_behalf`.
    ///
    /// Exactly one of `assets` and `shares` must be nonzero. Assets convert to
    /// shares rounded down; shares convert to assets rounded up.
    ///
    /// Returns `(assets_supplied, shares_minted)`.
    pub fn supply(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        assets: U256,
        shares: U256,
        on_behalf: Address,
        now: u64,
    ) -> Result<(U256, U256)> {
        exactly_one_nonzero(assets, shares)?;
        non_zero_address(on_behalf)?;

        let mut update = self.begin(market_params, now)?;
        let (assets, shares) = if assets.is_zero() {
            (
                update.market.to_supply_assets(shares, RoundingDirection::Up)?,
                shares,
            )
        } else {
            (
                assets,
                update.market.to_supply_shares(assets, RoundingDirection::Down)?,
            )
        };

        let mut position = update.position(&self.storage, &on_behalf);
        position.supply_shares = checked_add(position.supply_shares, shares)?;
        update.market.total_supply_shares = checked_add(update.market.total_supply_shares, shares)?;
        update.market.total_supply_assets = checked_add(update.market.total_supply_assets, assets)?;
        update.set_position(on_behalf, position);

        debug!(id = %update.id, %caller, %on_behalf, %assets, %shares, "supply");
        update.commit(&mut self.storage);
        Ok((assets, shares))
    }

    /// Withdraws loan assets from the position of `on_behalf`.
    ///
    /// Assets convert to shares rounded up; shares convert to assets rounded down.
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the caller may not manage `on_behalf`,
    /// `InsufficientLiquidity` if the withdrawal would leave borrows uncovered.
    pub fn withdraw(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        assets: U256,
        shares: U256,
        on_behalf: Address,
        receiver: Address,
        now: u64,
    ) -> Result<(U256, U256)> {
        exactly_one_nonzero(assets, shares)?;
        non_zero_address(on_behalf)?;
        non_zero_address(receiver)?;
        self.authorized(caller, on_behalf)?;

        let mut update = self.begin(market_params, now)?;
        let (assets, shares) = if assets.is_zero() {
            (
                update.market.to_supply_assets(shares, RoundingDirection::Down)?,
                shares,
            )
        } else {
            (
                assets,
                update.market.to_supply_shares(assets, RoundingDirection::Up)?,
            )
        };

        let mut position = update.position(&self.storage, &on_behalf);
        position.supply_shares = checked_sub(position.supply_shares, shares)?;
        update.market.total_supply_shares = checked_sub(update.market.total_supply_shares, shares)?;
        update.market.total_supply_assets = checked_sub(update.market.total_supply_assets, assets)?;
        update.set_position(on_behalf, position);

        if update.market.total_borrow_assets > update.market.total_supply_assets {
            return Err(MorphoError::InsufficientLiquidity);
        }

        debug!(id = %update.id, %caller, %on_behalf, %receiver, %assets, %shares, "withdraw");
        update.commit(&mut self.storage);
        Ok((assets, shares))
    }

    // ==================== Borrow Side ====================

    /// Borrows loan assets against the collateral of `on_behalf`.
    ///
    /// Assets convert to shares rounded up; shares convert to assets rounded down.
    /// `collateral_price` is the WAD-scaled price of one collateral unit in loan assets.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, then `InsufficientCollateral` if the position ends up
    /// unhealthy, then `InsufficientLiquidity`.
    pub fn borrow(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        assets: U256,
        shares: U256,
        on_behalf: Address,
        receiver: Address,
        collateral_price: U256,
        now: u64,
    ) -> Result<(U256, U256)> {
        exactly_one_nonzero(assets, shares)?;
        non_zero_address(on_behalf)?;
        non_zero_address(receiver)?;
        self.authorized(caller, on_behalf)?;

        let mut update = self.begin(market_params, now)?;
        let (assets, shares) = if assets.is_zero() {
            (
                update.market.to_borrow_assets(shares, RoundingDirection::Down)?,
                shares,
            )
        } else {
            (
                assets,
                update.market.to_borrow_shares(assets, RoundingDirection::Up)?,
            )
        };

        let mut position = update.position(&self.storage, &on_behalf);
        position.borrow_shares = checked_add(position.borrow_shares, shares)?;
        update.market.total_borrow_shares = checked_add(update.market.total_borrow_shares, shares)?;
        update.market.total_borrow_assets = checked_add(update.market.total_borrow_assets, assets)?;
        update.set_position(on_behalf, position);

        if !update
            .market
            .is_healthy(&position, market_params.lltv, collateral_price)?
        {
            return Err(MorphoError::InsufficientCollateral);
        }
        if update.market.total_borrow_assets > update.market.total_supply_assets {
            return Err(MorphoError::InsufficientLiquidity);
        }

        debug!(id = %update.id, %caller, %on_behalf, %receiver, %assets, %shares, "borrow");
        update.commit(&mut self.storage);
        Ok((assets, shares))
    }

    /// Repays debt of `on_behalf`. Anyone may repay anyone's debt.
    ///
    /// Assets convert to shares rounded down; shares convert to assets rounded
    /// up. Burned shares are capped at the position's debt, in which case the
    /// assets are recomputed for the capped amount.
    ///
    /// Returns `(assets_repaid, shares_burned)`.
    pub fn repay(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        assets: U256,
        shares: U256,
        on_behalf: Address,
        now: u64,
    ) -> Result<(U256, U256)> {
        exactly_one_nonzero(assets, shares)?;
        non_zero_address(on_behalf)?;

        let mut update = self.begin(market_params, now)?;
        let mut position = update.position(&self.storage, &on_behalf);

        let (mut assets, mut shares) = if assets.is_zero() {
            (
                update.market.to_borrow_assets(shares, RoundingDirection::Up)?,
                shares,
            )
        } else {
            (
                assets,
                update.market.to_borrow_shares(assets, RoundingDirection::Down)?,
            )
        };
        if shares > position.borrow_shares {
            shares = position.borrow_shares;
            assets = update.market.to_borrow_assets(shares, RoundingDirection::Up)?;
        }

        position.borrow_shares = checked_sub(position.borrow_shares, shares)?;
        update.market.total_borrow_shares = checked_sub(update.market.total_borrow_shares, shares)?;
        update.market.total_borrow_assets = zero_floor_sub(update.market.total_borrow_assets, assets);
        update.set_position(on_behalf, position);

        debug!(id = %update.id, %caller, %on_behalf, %assets, %shares, "repay");
        update.commit(&mut self.storage);
        Ok((assets, shares))
    }

    // ==================== Collateral ====================

    /// Adds collateral to the position of `on_behalf`.
    pub fn supply_collateral(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        assets: U256,
        on_behalf: Address,
        now: u64,
    ) -> Result<()> {
        if assets.is_zero() {
            return Err(MorphoError::ZeroAssets);
        }
        non_zero_address(on_behalf)?;

        let mut update = self.begin(market_params, now)?;
        let mut position = update.position(&self.storage, &on_behalf);
        position.collateral = checked_add(position.collateral, assets)?;
        update.set_position(on_behalf, position);

        debug!(id = %update.id, %caller, %on_behalf, %assets, "supply collateral");
        update.commit(&mut self.storage);
        Ok(())
    }

    /// Removes collateral from the position of `on_behalf`.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `Uint256Overflow` when removing more than the position
    /// holds, `InsufficientCollateral` if the position ends up unhealthy.
    pub fn withdraw_collateral(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        assets: U256,
        on_behalf: Address,
        receiver: Address,
        collateral_price: U256,
        now: u64,
    ) -> Result<()> {
        if assets.is_zero() {
            return Err(MorphoError::ZeroAssets);
        }
        non_zero_address(on_behalf)?;
        non_zero_address(receiver)?;
        self.authorized(caller, on_behalf)?;

        let mut update = self.begin(market_params, now)?;
        let mut position = update.position(&self.storage, &on_behalf);
        position.collateral = checked_sub(position.collateral, assets)?;
        update.set_position(on_behalf, position);

        if !update
            .market
            .is_healthy(&position, market_params.lltv, collateral_price)?
        {
            return Err(MorphoError::InsufficientCollateral);
        }

        debug!(id = %update.id, %caller, %on_behalf, %receiver, %assets, "withdraw collateral");
        update.commit(&mut self.storage);
        Ok(())
    }

    // ==================== Liquidation ====================

    /// Liquidates an unhealthy position.
    ///
    /// Exactly one of `seized_assets` (collateral to seize) and `repaid_shares`
    /// (debt to repay) must be nonzero; the other is derived with the
    /// liquidation incentive factor. When the borrower's collateral reaches
    /// zero, any remaining debt is written off against the suppliers.
    ///
    /// Returns `(seized_assets, repaid_assets)`.
    ///
    /// # Errors
    ///
    /// `HealthyPosition` if the borrower is healthy at `collateral_price`.
    pub fn liquidate(
        &mut self,
        caller: Address,
        market_params: &MarketParams,
        borrower: Address,
        seized_assets: U256,
        repaid_shares: U256,
        collateral_price: U256,
        now: u64,
    ) -> Result<(U256, U256)> {
        exactly_one_nonzero(seized_assets, repaid_shares)?;

        let mut update = self.begin(market_params, now)?;
        let mut position = update.position(&self.storage, &borrower);
        let lltv = market_params.lltv;

        if update.market.is_healthy(&position, lltv, collateral_price)? {
            return Err(MorphoError::HealthyPosition);
        }

        let (seized_assets, repaid_shares) = if seized_assets.is_zero() {
            (
                update
                    .market
                    .get_liquidation_seized_assets(repaid_shares, lltv, collateral_price)?,
                repaid_shares,
            )
        } else {
            (
                seized_assets,
                update
                    .market
                    .get_liquidation_repaid_shares(seized_assets, lltv, collateral_price)?,
            )
        };
        let repaid_assets = update
            .market
            .to_borrow_assets(repaid_shares, RoundingDirection::Up)?;

        position.borrow_shares = checked_sub(position.borrow_shares, repaid_shares)?;
        update.market.total_borrow_shares =
            checked_sub(update.market.total_borrow_shares, repaid_shares)?;
        update.market.total_borrow_assets =
            zero_floor_sub(update.market.total_borrow_assets, repaid_assets);
        position.collateral = checked_sub(position.collateral, seized_assets)?;

        let mut bad_debt_assets = U256::ZERO;
        let mut bad_debt_shares = U256::ZERO;
        if position.collateral.is_zero() && !position.borrow_shares.is_zero() {
            bad_debt_shares = position.borrow_shares;
            bad_debt_assets = min(
                update.market.total_borrow_assets,
                update
                    .market
                    .to_borrow_assets(bad_debt_shares, RoundingDirection::Up)?,
            );

            update.market.total_borrow_assets =
                checked_sub(update.market.total_borrow_assets, bad_debt_assets)?;
            update.market.total_supply_assets =
                checked_sub(update.market.total_supply_assets, bad_debt_assets)?;
            update.market.total_borrow_shares =
                checked_sub(update.market.total_borrow_shares, bad_debt_shares)?;
            position.borrow_shares = U256::ZERO;
        }
        update.set_position(borrower, position);

        debug!(
            id = %update.id,
            %caller,
            %borrower,
            %seized_assets,
            %repaid_assets,
            %repaid_shares,
            %bad_debt_assets,
            %bad_debt_shares,
            "liquidate"
        );
        update.commit(&mut self.storage);
        Ok((seized_assets, repaid_assets))
    }

    // ==================== Views ====================

    pub fn market(&self, id: &MarketId) -> Option<Market> {
        self.storage.market(id)
    }

    /// The position of `account`, all-zero if it never touched the market
    pub fn position(&self, id: &MarketId, account: &Address) -> Position {
        self.storage.position_or_default(id, account)
    }

    pub fn id_to_market_params(&self, id: &MarketId) -> Option<MarketParams> {
        self.storage.market_params(id)
    }

    pub fn is_irm_enabled(&self, irm: &Address) -> bool {
        self.storage.is_irm_enabled(irm)
    }

    pub fn is_lltv_enabled(&self, lltv: &U256) -> bool {
        self.storage.is_lltv_enabled(lltv)
    }

    pub fn is_authorized(&self, authorizer: &Address, authorized: &Address) -> bool {
        self.storage.is_authorized(authorizer, authorized)
    }

    /// Checks the health of a position against the stored market, without accruing.
    pub fn is_healthy(
        &self,
        market_params: &MarketParams,
        id: &MarketId,
        account: &Address,
        collateral_price: U256,
    ) -> Result<bool> {
        let market = self.load_market(id)?;
        let position = self.position(id, account);
        market.is_healthy(&position, market_params.lltv, collateral_price)
    }

    /// The market as it would be after accruing interest up to `now`.
    pub fn expected_market_balances(
        &self,
        market_params: &MarketParams,
        now: u64,
    ) -> Result<Market> {
        Ok(self.begin(market_params, now)?.market)
    }

    /// The supply assets of `account` after accruing interest up to `now`, rounded down.
    pub fn expected_supply_assets(
        &self,
        market_params: &MarketParams,
        account: &Address,
        now: u64,
    ) -> Result<U256> {
        let update = self.begin(market_params, now)?;
        update
            .position(&self.storage, account)
            .supply_assets(&update.market)
    }

    /// The debt of `account` after accruing interest up to `now`, rounded up.
    pub fn expected_borrow_assets(
        &self,
        market_params: &MarketParams,
        account: &Address,
        now: u64,
    ) -> Result<U256> {
        let update = self.begin(market_params, now)?;
        update
            .position(&self.storage, account)
            .borrow_assets(&update.market)
    }
}
