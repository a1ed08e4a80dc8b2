// 3.0: the recompute pipeline. one pure function from (draft, market price, account, config)
// to everything the order form displays. nothing is cached between calls.

use crate::account::AccountSource;
use crate::commission::estimate_commission;
use crate::config::DeskConfig;
use crate::liquidation::calculate_liquidation_price;
use crate::margin::{max_position_amount, required_margin, MarginSnapshot};
use crate::order::OrderDraft;
use crate::types::Figure;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub commission: Figure,
    pub liquidation_price: Figure,
    pub required_margin: Figure,
    pub max_position_amount: Figure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskView {
    pub metrics: DerivedMetrics,
    pub margin: MarginSnapshot,
}

pub fn derive_metrics(
    draft: &OrderDraft,
    market_price: Option<Decimal>,
    account: &dyn AccountSource,
    config: &DeskConfig,
) -> RiskView {
    let amount = draft.amount_figure();
    let leverage = draft.effective_leverage();
    let price = draft.reference_price(market_price);

    let metrics = DerivedMetrics {
        commission: estimate_commission(
            amount,
            price,
            account.trailing_volume(),
            &config.commission,
        ),
        liquidation_price: calculate_liquidation_price(
            price,
            leverage,
            draft.side,
            &config.liquidation,
        ),
        required_margin: required_margin(amount, leverage),
        max_position_amount: max_position_amount(account.margin_balance(), leverage),
    };

    let margin = MarginSnapshot::compute(
        account.wallet_balance(),
        account.margin_balance(),
        amount,
        leverage,
    );

    RiskView { metrics, margin }
}

impl DerivedMetrics {
    pub fn all_valid(&self) -> bool {
        self.commission.is_valid()
            && self.liquidation_price.is_valid()
            && self.required_margin.is_valid()
            && self.max_position_amount.is_valid()
    }
}

impl Default for RiskView {
    fn default() -> Self {
        Self {
            metrics: DerivedMetrics::default(),
            margin: MarginSnapshot {
                wallet_balance: Decimal::ZERO,
                margin_balance: Decimal::ZERO,
                free_margin: Figure::invalid(),
                wallet_usage_percent: Figure::invalid(),
            },
        }
    }
}
