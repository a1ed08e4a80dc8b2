// 7.0 config.rs: all settings in one place. commission tiers, maintenance rate,
// leverage ceiling, the illustrative wallet, the quote feed, and pair storage.
// 7.1 env overrides sit on top of a preset. json files deserialize straight into DeskConfig.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::account::AccountConfig;
use crate::commission::CommissionSchedule;
use crate::liquidation::{liquidation_cushion, LiquidationParams};
use crate::margin::MarginParams;
use crate::pair_store::StorageConfig;
use crate::price_feed::QuoteFeedConfig;
use crate::types::{Leverage, TradingPair};

pub const ENV_QUOTE_URL: &str = "ORDER_DESK_QUOTE_URL";
pub const ENV_API_KEY: &str = "ORDER_DESK_API_KEY";
pub const ENV_POLL_SECS: &str = "ORDER_DESK_POLL_SECS";
pub const ENV_MAX_LEVERAGE: &str = "ORDER_DESK_MAX_LEVERAGE";
pub const ENV_WALLET_BALANCE: &str = "ORDER_DESK_WALLET_BALANCE";
pub const ENV_STORE_PATH: &str = "ORDER_DESK_STORE_PATH";
pub const ENV_ENCRYPTION_KEY: &str = "ORDER_DESK_ENCRYPTION_KEY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub commission: CommissionSchedule,
    pub liquidation: LiquidationParams,
    pub margin: MarginParams,
    pub account: AccountConfig,
    pub quote_feed: QuoteFeedConfig,
    pub storage: StorageConfig,
}

impl DeskConfig {
    // Create a configuration preset for testnet
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.margin.max_leverage = Leverage::new(dec!(20)).unwrap_or(Leverage::ONE);
        config.quote_feed.poll_interval_secs = 10;
        config
    }

    // Create a configuration preset for mainnet with conservative settings
    pub fn mainnet_conservative() -> Self {
        let mut config = Self::default();
        config.margin.max_leverage = Leverage::new(dec!(50)).unwrap_or(Leverage::ONE);
        config.liquidation.maintenance_base_rate = dec!(0.01);
        config
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ORDER_DESK_*` variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    // lookup is injected so tests don't have to touch the process environment
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_QUOTE_URL) {
            self.quote_feed.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.quote_feed.api_key = if key.is_empty() { None } else { Some(key) };
        }
        if let Some(raw) = lookup(ENV_POLL_SECS) {
            self.quote_feed.poll_interval_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::env(ENV_POLL_SECS, &raw))?;
        }
        if let Some(raw) = lookup(ENV_MAX_LEVERAGE) {
            self.margin.max_leverage = Decimal::from_str(raw.trim())
                .ok()
                .and_then(Leverage::new)
                .ok_or_else(|| ConfigError::env(ENV_MAX_LEVERAGE, &raw))?;
        }
        if let Some(raw) = lookup(ENV_WALLET_BALANCE) {
            let balance = Decimal::from_str(raw.trim())
                .map_err(|_| ConfigError::env(ENV_WALLET_BALANCE, &raw))?;
            self.account.wallet_balance = balance;
            self.account.margin_balance = balance;
        }
        if let Some(path) = lookup(ENV_STORE_PATH) {
            self.storage.path = Some(path).filter(|p| !p.trim().is_empty());
        }
        if let Some(key) = lookup(ENV_ENCRYPTION_KEY) {
            self.storage.encryption_key = if key.is_empty() { None } else { Some(key) };
        }

        self.validate()?;
        Ok(self)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.liquidation.maintenance_base_rate;
        if base <= Decimal::ZERO || base >= Decimal::ONE {
            return Err(ConfigError::InvalidMargin {
                reason: "maintenance base rate must be between 0 and 1".to_string(),
            });
        }

        // past this point long liquidation would sit above entry
        if liquidation_cushion(self.margin.max_leverage, &self.liquidation) < Decimal::ZERO {
            return Err(ConfigError::InvalidMargin {
                reason: format!(
                    "max leverage {} leaves no liquidation cushion",
                    self.margin.max_leverage
                ),
            });
        }

        if !self.commission.is_monotonic() {
            return Err(ConfigError::InvalidCommission {
                reason: "tiers must be sorted by volume with rates falling as volume grows"
                    .to_string(),
            });
        }

        if self.account.wallet_balance < Decimal::ZERO || self.account.margin_balance < Decimal::ZERO {
            return Err(ConfigError::InvalidAccount {
                reason: "balances cannot be negative".to_string(),
            });
        }

        if self.quote_feed.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidQuoteFeed {
                reason: "base url is empty".to_string(),
            });
        }

        if self.quote_feed.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidQuoteFeed {
                reason: "poll interval must be at least 1 second".to_string(),
            });
        }

        if self.quote_feed.pairs.is_empty() {
            return Err(ConfigError::InvalidQuoteFeed {
                reason: "need at least 1 trading pair".to_string(),
            });
        }

        Ok(())
    }

    pub fn max_leverage(&self) -> Decimal {
        self.margin.max_leverage.value()
    }

    pub fn initial_pair(&self) -> Option<&TradingPair> {
        self.quote_feed.pairs.first()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid margin settings: {reason}")]
    InvalidMargin { reason: String },

    #[error("invalid commission schedule: {reason}")]
    InvalidCommission { reason: String },

    #[error("invalid account settings: {reason}")]
    InvalidAccount { reason: String },

    #[error("invalid quote feed settings: {reason}")]
    InvalidQuoteFeed { reason: String },

    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    fn env(var: &'static str, value: &str) -> Self {
        Self::InvalidEnv {
            var,
            value: value.to_string(),
        }
    }
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> DeskConfig {
        match self {
            Environment::Development => DeskConfig::default(),
            Environment::Testnet => DeskConfig::testnet(),
            Environment::Mainnet => DeskConfig::mainnet_conservative(),
        }
    }
}
