//! Commission estimation from notional value and trailing 30 day volume.
//!
//! The rate is a step function of volume. Tiers are checked from the highest
//! threshold down and the first one the volume strictly exceeds wins, so a
//! higher tier replaces the lower ones instead of blending with them.

use crate::types::Figure;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTier {
    /// Volume must be strictly above this to qualify.
    pub min_volume: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSchedule {
    /// Sorted by `min_volume`, highest first.
    pub tiers: Vec<CommissionTier>,
    /// Rate when no tier threshold is exceeded.
    pub base_rate: Decimal,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            tiers: vec![
                CommissionTier { min_volume: dec!(10_000_000), rate: dec!(0.0004) },
                CommissionTier { min_volume: dec!(5_000_000), rate: dec!(0.0006) },
                CommissionTier { min_volume: dec!(1_000_000), rate: dec!(0.0008) },
            ],
            base_rate: dec!(0.001),
        }
    }
}

impl CommissionSchedule {
    /// Thresholds strictly descending and rates never rising with volume.
    pub fn is_monotonic(&self) -> bool {
        let thresholds_descend = self
            .tiers
            .windows(2)
            .all(|w| w[0].min_volume > w[1].min_volume);
        let rates_ascend_down_the_list = self.tiers.windows(2).all(|w| w[0].rate <= w[1].rate);
        let base_is_highest = self.tiers.last().map_or(true, |t| t.rate <= self.base_rate);
        let non_negative = self.base_rate >= Decimal::ZERO
            && self.tiers.iter().all(|t| t.rate >= Decimal::ZERO);

        thresholds_descend && rates_ascend_down_the_list && base_is_highest && non_negative
    }
}

pub fn commission_rate(trailing_volume: Decimal, schedule: &CommissionSchedule) -> Decimal {
    schedule
        .tiers
        .iter()
        .find(|tier| trailing_volume > tier.min_volume)
        .map(|tier| tier.rate)
        .unwrap_or(schedule.base_rate)
}

/// amount * price * rate(volume)
pub fn estimate_commission(
    amount: Figure,
    price: Figure,
    trailing_volume: Decimal,
    schedule: &CommissionSchedule,
) -> Figure {
    amount * price * commission_rate(trailing_volume, schedule)
}
