//! Deployment configuration
//!
//! Resolved once per deployment target and handed to the factory at deploy
//! time. Pools read their parameters from the factory that created them.

use serde::{Deserialize, Serialize};
use std::fmt;
use types::fee::{LP_FEE_NUMERATOR, PROTOCOL_FEE_BPS};
use types::ids::Address;
use types::numeric::{Amount, BPS_DENOMINATOR};

use crate::errors::ConfigError;

/// Protocol-wide economic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Cap on the caller-chosen frontend fee.
    pub max_frontend_fee_bps: u64,
    /// Shares locked forever on a pool's first supply.
    pub minimum_liquidity: Amount,
    /// Distinct approvals an administrative action needs.
    pub approval_threshold: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frontend_fee_bps: 10,
            minimum_liquidity: 1_000,
            approval_threshold: 1,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // LP fee is 2/1000 = 20 bps
        let fixed_fee_bps = LP_FEE_NUMERATOR * 10 + PROTOCOL_FEE_BPS;
        let total_fee_bps = self.max_frontend_fee_bps.checked_add(fixed_fee_bps);
        if total_fee_bps.map_or(true, |bps| bps >= BPS_DENOMINATOR) {
            return Err(ConfigError::Invalid(format!(
                "max_frontend_fee_bps {} leaves nothing for the trader",
                self.max_frontend_fee_bps
            )));
        }
        if self.minimum_liquidity == 0 {
            return Err(ConfigError::Invalid("minimum_liquidity must be positive".into()));
        }
        if self.approval_threshold == 0 {
            return Err(ConfigError::Invalid("approval_threshold must be at least 1".into()));
        }
        Ok(())
    }
}

/// Deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    Mainnet,
    Zeko,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Devnet => "devnet",
            Network::Mainnet => "mainnet",
            Network::Zeko => "zeko",
        };
        f.write_str(name)
    }
}

/// Everything a factory deployment needs, for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub network: Network,
    /// Initial protocol fee collector
    #[serde(default)]
    pub protocol: Option<Address>,
    /// Initial delegate
    #[serde(default)]
    pub delegator: Option<Address>,
    /// Hash of the approved pool verification key
    #[serde(with = "hex::serde")]
    pub pool_verification_key_hash: [u8; 32],
    /// Hash of the factory's own verification key
    #[serde(with = "hex::serde")]
    pub factory_verification_key_hash: [u8; 32],
    #[serde(default)]
    pub params: ProtocolConfig,
}

impl DeploymentConfig {
    /// Parse and validate a JSON deployment file.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_verification_key_hash == [0u8; 32] {
            return Err(ConfigError::Invalid("pool verification key hash is unset".into()));
        }
        if self.factory_verification_key_hash == [0u8; 32] {
            return Err(ConfigError::Invalid("factory verification key hash is unset".into()));
        }
        if self.protocol.is_some_and(|a| a.is_empty()) {
            return Err(ConfigError::Invalid("protocol address must not be the burn address".into()));
        }
        self.params.validate()
    }
}
