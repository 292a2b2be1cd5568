//! Market parameters and market identifier derivation.

use alloy_primitives::{keccak256, Address, FixedBytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::{MorphoError, Result};

/// Type alias for a 32-byte market ID
pub type MarketId = FixedBytes<32>;

/// Length of the packed parameter buffer hashed into a [`MarketId`] (5 * 32 bytes)
pub const MARKET_PARAMS_BYTES_LENGTH: usize = 5 * 32;

/// The immutable parameters that define a market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketParams {
    /// Token lent and borrowed in the market
    pub loan_token: Address,
    /// Token posted as collateral
    pub collateral_token: Address,
    /// Price oracle for the collateral
    pub oracle: Address,
    /// Interest rate model
    pub irm: Address,
    /// Liquidation loan-to-value (WAD-scaled)
    pub lltv: U256,
}

impl MarketParams {
    /// The identifier of the market these parameters define.
    pub fn id(&self) -> MarketId {
        compute_market_id(self)
    }
}

/// Packs the parameters the way the contract lays out the struct in memory:
/// four 32-byte slots with each address right-aligned, then the big-endian LLTV.
pub fn market_params_bytes(params: &MarketParams) -> [u8; MARKET_PARAMS_BYTES_LENGTH] {
    let mut data = [0u8; MARKET_PARAMS_BYTES_LENGTH];

    let addresses = [
        params.loan_token,
        params.collateral_token,
        params.oracle,
        params.irm,
    ];
    for (slot, address) in addresses.iter().enumerate() {
        let start = slot * 32 + 12;
        data[start..start + 20].copy_from_slice(address.as_slice());
    }
    data[128..].copy_from_slice(&params.lltv.to_be_bytes::<32>());

    data
}

/// Computes the market identifier: keccak-256 of the packed parameters.
pub fn compute_market_id(params: &MarketParams) -> MarketId {
    keccak256(market_params_bytes(params))
}

/// Rejects parameters no market can be created with.
pub fn validate_market_params(params: &MarketParams) -> Result<()> {
    if params.loan_token.is_zero()
        || params.collateral_token.is_zero()
        || params.oracle.is_zero()
        || params.irm.is_zero()
    {
        return Err(MorphoError::ZeroAddress);
    }

    if params.loan_token == params.collateral_token {
        return Err(MorphoError::InconsistentInput);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn create_test_params() -> MarketParams {
        MarketParams {
            loan_token: address!("0x1111111111111111111111111111111111111111"),
            collateral_token: address!("0x2222222222222222222222222222222222222222"),
            oracle: address!("0x3333333333333333333333333333333333333333"),
            irm: address!("0x4444444444444444444444444444444444444444"),
            lltv: U256::from(860_000_000_000_000_000u64),
        }
    }

    #[test]
    fn test_packing_layout() {
        let params = create_test_params();
        let data = market_params_bytes(&params);

        // Address padding is zero, the last byte of each address slot is set
        assert!(data[..12].iter().all(|b| *b == 0));
        assert_eq!(data[31], 0x11);
        assert_eq!(data[63], 0x22);
        assert_eq!(data[95], 0x33);
        assert_eq!(data[127], 0x44);
        assert_eq!(&data[128..], &params.lltv.to_be_bytes::<32>());
    }

    #[test]
    fn test_market_id_is_pure() {
        let params = create_test_params();
        assert_eq!(compute_market_id(&params), compute_market_id(&params));
        assert_eq!(params.id(), keccak256(market_params_bytes(&params)));
    }

    #[test]
    fn test_market_id_changes_with_lltv_only() {
        let params = create_test_params();
        let other = MarketParams {
            lltv: params.lltv + U256::from(1),
            ..params
        };
        assert_ne!(compute_market_id(&params), compute_market_id(&other));
    }

    #[test]
    fn test_market_id_changes_with_each_address() {
        let params = create_test_params();
        let other_address = address!("0x5555555555555555555555555555555555555555");
        let variants = [
            MarketParams {
                loan_token: other_address,
                ..params
            },
            MarketParams {
                collateral_token: other_address,
                ..params
            },
            MarketParams {
                oracle: other_address,
                ..params
            },
            MarketParams {
                irm: other_address,
                ..params
            },
        ];
        for variant in &variants {
            assert_ne!(variant.id(), params.id());
        }
    }

    #[test]
    fn test_validate_market_params() {
        let params = create_test_params();
        assert_eq!(validate_market_params(&params), Ok(()));

        let zero_oracle = MarketParams {
            oracle: Address::ZERO,
            ..params
        };
        assert_eq!(
            validate_market_params(&zero_oracle),
            Err(MorphoError::ZeroAddress)
        );

        let same_tokens = MarketParams {
            collateral_token: params.loan_token,
            ..params
        };
        assert_eq!(
            validate_market_params(&same_tokens),
            Err(MorphoError::InconsistentInput)
        );
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(create_test_params()).unwrap();
        assert!(json.get("loanToken").is_some());
        assert!(json.get("collateralToken").is_some());
        let back: MarketParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, create_test_params());
    }
}
