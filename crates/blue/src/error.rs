//! Error types for the accounting engine.
//!
//! Protocol variants correspond to the on-chain revert reasons and
//! display the same messages.

use thiserror::Error;

/// Errors returned by the engine and its arithmetic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MorphoError {
    /// The caller is not the owner
    #[error("not owner")]
    NotOwner,

    /// The LLTV is not below 100%
    #[error("max LLTV exceeded")]
    MaxLltvExceeded,

    /// The fee is above the maximum fee
    #[error("max fee exceeded")]
    MaxFeeExceeded,

    /// The value is already set
    #[error("already set")]
    AlreadySet,

    /// The IRM is not enabled at market creation
    #[error("IRM not enabled")]
    IrmNotEnabled,

    /// The LLTV is not enabled at market creation
    #[error("LLTV not enabled")]
    LltvNotEnabled,

    /// The market is already created
    #[error("market already created")]
    MarketAlreadyCreated,

    /// The market is not created
    #[error("market not created")]
    MarketNotCreated,

    /// The input is invalid
    #[error("inconsistent input")]
    InconsistentInput,

    /// Both the asset and share amounts are zero
    #[error("zero assets")]
    ZeroAssets,

    /// An address that must be set is zero
    #[error("zero address")]
    ZeroAddress,

    /// The caller is not authorized to act on behalf of the account
    #[error("unauthorized")]
    Unauthorized,

    /// The position would not be collateralized enough
    #[error("insufficient collateral")]
    InsufficientCollateral,

    /// The market would not have enough liquidity
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// The position is healthy and cannot be liquidated
    #[error("position is healthy")]
    HealthyPosition,

    /// Reserved for signature-based authorization
    #[error("invalid signature")]
    InvalidSignature,

    /// Reserved for signature-based authorization
    #[error("signature expired")]
    SignatureExpired,

    /// Reserved for signature-based authorization
    #[error("invalid nonce")]
    InvalidNonce,

    /// Division by zero in the arithmetic layer
    #[error("divide by zero")]
    DivideByZero,

    /// A value left the 256-bit range (including subtraction underflow)
    #[error("uint256 overflow")]
    Uint256Overflow,

    /// Interest accrual was attempted with a timestamp before the last update
    #[error("Invalid interest accrual: timestamp {timestamp} is before last update {last_update}")]
    InvalidInterestAccrual { timestamp: u64, last_update: u64 },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, MorphoError>;
