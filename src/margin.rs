//! Margin and position sizing for the order form.
//!
//! Required margin is the order amount divided by leverage. The largest
//! position the account can open is its margin balance times leverage. The
//! margin snapshot turns the account figures into what the wallet panel shows.

use crate::types::{Figure, Leverage};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginParams {
    /// Leverage entered above this is clamped down to it.
    pub max_leverage: Leverage,
}

impl Default for MarginParams {
    fn default() -> Self {
        Self {
            max_leverage: Leverage::new(dec!(100)).unwrap_or(Leverage::ONE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeverageCheck {
    WithinLimit,
    Clamped { requested: Decimal, max: Leverage },
}

/// Caps a requested leverage at the configured maximum.
pub fn check_leverage(requested: Decimal, params: &MarginParams) -> LeverageCheck {
    if requested > params.max_leverage.value() {
        LeverageCheck::Clamped {
            requested,
            max: params.max_leverage,
        }
    } else {
        LeverageCheck::WithinLimit
    }
}

pub fn required_margin(amount: Figure, leverage: Leverage) -> Figure {
    amount / leverage.value()
}

pub fn max_position_amount(margin_balance: Decimal, leverage: Leverage) -> Figure {
    Figure::new(margin_balance) * leverage.value()
}

/// Calculate free margin (balance left after this order's margin)
pub fn free_margin(margin_balance: Decimal, required: Figure) -> Figure {
    Figure::new(margin_balance) - required
}

pub fn wallet_usage_percent(amount: Figure, wallet_balance: Decimal) -> Figure {
    amount / Figure::new(wallet_balance) * dec!(100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginSnapshot {
    pub wallet_balance: Decimal,
    pub margin_balance: Decimal,
    pub free_margin: Figure,
    pub wallet_usage_percent: Figure,
}

impl MarginSnapshot {
    pub fn compute(
        wallet_balance: Decimal,
        margin_balance: Decimal,
        amount: Figure,
        leverage: Leverage,
    ) -> Self {
        Self {
            wallet_balance,
            margin_balance,
            free_margin: free_margin(margin_balance, required_margin(amount, leverage)),
            wallet_usage_percent: wallet_usage_percent(amount, wallet_balance),
        }
    }
}
