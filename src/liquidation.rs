//! Liquidation price estimation for a prospective leveraged position.
//!
//! The maintenance buffer grows with leverage: `base_rate * (1 + leverage / 100)`.
//! Higher leverage both shrinks the cushion (the `1 / leverage` term) and raises
//! the maintenance requirement, so the liquidation price converges toward entry.

use crate::types::{Figure, Leverage, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationParams {
    /// Maintenance margin rate at 0x, before the leverage scaling.
    pub maintenance_base_rate: Decimal,
}

impl Default for LiquidationParams {
    fn default() -> Self {
        Self {
            maintenance_base_rate: dec!(0.005),
        }
    }
}

pub fn adjusted_maintenance(base_rate: Decimal, leverage: Leverage) -> Decimal {
    base_rate * (Decimal::ONE + leverage.value() / dec!(100))
}

/// Distance from entry to liquidation as a fraction of entry. Negative once the
/// maintenance buffer outgrows the initial margin.
pub fn liquidation_cushion(leverage: Leverage, params: &LiquidationParams) -> Decimal {
    leverage.inverse() - adjusted_maintenance(params.maintenance_base_rate, leverage)
}

pub fn calculate_liquidation_price(
    entry_price: Figure,
    leverage: Leverage,
    side: Side,
    params: &LiquidationParams,
) -> Figure {
    let cushion = liquidation_cushion(leverage, params);
    let factor = match side {
        Side::Long => Decimal::ONE - cushion,
        Side::Short => Decimal::ONE + cushion,
    };
    entry_price * factor
}
