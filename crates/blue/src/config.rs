//! Engine configuration.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or misses a field
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The owner must be set
    #[error("Configuration owner must not be the zero address")]
    ZeroOwner,
}

/// Initial administration of an engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorphoConfig {
    /// The account allowed to run administrative operations
    pub owner: Address,
    /// The account credited with fee shares
    #[serde(default)]
    pub fee_recipient: Address,
}

impl MorphoConfig {
    /// Create a new configuration with the given owner and no fee recipient.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            fee_recipient: Address::ZERO,
        }
    }

    /// Set the fee recipient.
    pub fn with_fee_recipient(mut self, fee_recipient: Address) -> Self {
        self.fee_recipient = fee_recipient;
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// ```rust
    /// use morpho_rs_blue::MorphoConfig;
    ///
    /// let config = MorphoConfig::from_json(
    ///     r#"{"owner": "0x1111111111111111111111111111111111111111"}"#,
    /// )
    /// .unwrap();
    /// assert!(config.fee_recipient.is_zero());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.owner.is_zero() {
            return Err(ConfigError::ZeroOwner);
        }
        Ok(config)
    }
}
