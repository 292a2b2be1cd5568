//! Storage port for the engine.
//!
//! The engine never owns global maps. Every read and write goes through a
//! [`Storage`] implementation injected at construction, so hosts can back it
//! with whatever they like. [`InMemoryStorage`] is the bundled implementation.
//!
//! Writes are only issued after an operation has passed every check, so a
//! backend sees either all of an operation's writes or none of them.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};

use crate::market::Market;
use crate::market_params::{MarketId, MarketParams};
use crate::position::Position;

/// Typed key spaces the engine reads and writes.
pub trait Storage {
    // Markets
    fn market(&self, id: &MarketId) -> Option<Market>;
    fn set_market(&mut self, id: MarketId, market: Market);

    // Market parameters, recorded at creation
    fn market_params(&self, id: &MarketId) -> Option<MarketParams>;
    fn set_market_params(&mut self, id: MarketId, params: MarketParams);

    // Positions, keyed by (market, account)
    fn position(&self, id: &MarketId, account: &Address) -> Option<Position>;
    fn set_position(&mut self, id: MarketId, account: Address, position: Position);

    // Enablement sets (append-only)
    fn is_irm_enabled(&self, irm: &Address) -> bool;
    fn enable_irm(&mut self, irm: Address);
    fn is_lltv_enabled(&self, lltv: &U256) -> bool;
    fn enable_lltv(&mut self, lltv: U256);

    // Authorizations, keyed by (authorizer, authorized)
    fn is_authorized(&self, authorizer: &Address, authorized: &Address) -> bool;
    fn set_authorized(&mut self, authorizer: Address, authorized: Address, is_authorized: bool);

    /// Returns the stored position, or an empty one if the account never touched the market
    fn position_or_default(&self, id: &MarketId, account: &Address) -> Position {
        self.position(id, account).unwrap_or_default()
    }
}

/// `HashMap`-backed storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InMemoryStorage {
    markets: HashMap<MarketId, Market>,
    market_params: HashMap<MarketId, MarketParams>,
    positions: HashMap<(MarketId, Address), Position>,
    enabled_irms: HashSet<Address>,
    enabled_lltvs: HashSet<U256>,
    authorizations: HashMap<(Address, Address), bool>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markets created so far
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }
}

impl Storage for InMemoryStorage {
    fn market(&self, id: &MarketId) -> Option<Market> {
        self.markets.get(id).copied()
    }

    fn set_market(&mut self, id: MarketId, market: Market) {
        self.markets.insert(id, market);
    }

    fn market_params(&self, id: &MarketId) -> Option<MarketParams> {
        self.market_params.get(id).copied()
    }

    fn set_market_params(&mut self, id: MarketId, params: MarketParams) {
        self.market_params.insert(id, params);
    }

    fn position(&self, id: &MarketId, account: &Address) -> Option<Position> {
        self.positions.get(&(*id, *account)).copied()
    }

    fn set_position(&mut self, id: MarketId, account: Address, position: Position) {
        self.positions.insert((id, account), position);
    }

    fn is_irm_enabled(&self, irm: &Address) -> bool {
        self.enabled_irms.contains(irm)
    }

    fn enable_irm(&mut self, irm: Address) {
        self.enabled_irms.insert(irm);
    }

    fn is_lltv_enabled(&self, lltv: &U256) -> bool {
        self.enabled_lltvs.contains(lltv)
    }

    fn enable_lltv(&mut self, lltv: U256) {
        self.enabled_lltvs.insert(lltv);
    }

    fn is_authorized(&self, authorizer: &Address, authorized: &Address) -> bool {
        self.authorizations
            .get(&(*authorizer, *authorized))
            .copied()
            .unwrap_or(false)
    }

    fn set_authorized(&mut self, authorizer: Address, authorized: Address, is_authorized: bool) {
        self.authorizations
            .insert((authorizer, authorized), is_authorized);
    }
}
