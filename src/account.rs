// 10.0: account figures the calculators read: wallet balance, margin balance,
// trailing 30 day volume. injected through AccountSource so the form never
// links against sample data directly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub trait AccountSource {
    fn wallet_balance(&self) -> Decimal;

    fn margin_balance(&self) -> Decimal;

    /// Traded notional over the last 30 days, drives the commission tier.
    fn trailing_volume(&self) -> Decimal;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub wallet_balance: Decimal,
    pub margin_balance: Decimal,
    pub trailing_volume_30d: Decimal,
}

impl Default for AccountConfig {
    fn default() -> Self {
        // hypothetical demo wallet
        Self {
            wallet_balance: dec!(10000),
            margin_balance: dec!(10000),
            trailing_volume_30d: Decimal::ZERO,
        }
    }
}

/// Fixed figures, used for the illustrative wallet and in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedAccount {
    wallet_balance: Decimal,
    margin_balance: Decimal,
    trailing_volume: Decimal,
}

impl FixedAccount {
    pub fn new(wallet_balance: Decimal, margin_balance: Decimal, trailing_volume: Decimal) -> Self {
        Self {
            wallet_balance,
            margin_balance,
            trailing_volume,
        }
    }

    pub fn from_config(config: &AccountConfig) -> Self {
        Self::new(
            config.wallet_balance,
            config.margin_balance,
            config.trailing_volume_30d,
        )
    }

    pub fn set_trailing_volume(&mut self, volume: Decimal) {
        self.trailing_volume = volume;
    }
}

impl AccountSource for FixedAccount {
    fn wallet_balance(&self) -> Decimal {
        self.wallet_balance
    }

    fn margin_balance(&self) -> Decimal {
        self.margin_balance
    }

    fn trailing_volume(&self) -> Decimal {
        self.trailing_volume
    }
}
