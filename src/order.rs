//! Order draft and the finalized order payload.
//!
//! The draft mirrors the form exactly: numeric fields stay as the text the user
//! typed and an empty string means "not set". The payload is the validated
//! snapshot handed to the submission handler and cannot be changed once built.

use crate::types::{parse_decimal, Figure, Leverage, MarginType, OrderType, Side, Timestamp, TradingPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub side: Side,
    pub order_type: OrderType,
    pub margin_type: MarginType,
    pub amount: String,
    pub leverage: String,
    pub order_price: String,
    pub trigger_price: String,
    pub take_profit: String,
    pub stop_loss: String,
    pub tp_sl_enabled: bool,
    pub post_only: bool,
}

impl OrderDraft {
    pub fn new(side: Side, order_type: OrderType) -> Self {
        Self {
            side,
            order_type,
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: &str) -> Self {
        self.amount = amount.to_string();
        self
    }

    pub fn with_leverage(mut self, leverage: &str) -> Self {
        self.leverage = leverage.to_string();
        self
    }

    pub fn with_order_price(mut self, price: &str) -> Self {
        self.order_price = price.to_string();
        self
    }

    pub fn with_trigger_price(mut self, price: &str) -> Self {
        self.trigger_price = price.to_string();
        self
    }

    pub fn with_tp_sl(mut self, take_profit: &str, stop_loss: &str) -> Self {
        self.tp_sl_enabled = true;
        self.take_profit = take_profit.to_string();
        self.stop_loss = stop_loss.to_string();
        self
    }

    pub fn with_margin_type(mut self, margin_type: MarginType) -> Self {
        self.margin_type = margin_type;
        self
    }

    pub fn amount_figure(&self) -> Figure {
        Figure::from_input(&self.amount)
    }

    pub fn effective_leverage(&self) -> Leverage {
        Leverage::from_input(&self.leverage)
    }

    /// True when the order carries its own price (limit or stop with the field filled in).
    pub fn uses_order_price(&self) -> bool {
        self.order_type.has_order_price() && !self.order_price.trim().is_empty()
    }

    /// Price the order is evaluated against: its own order price when set,
    /// otherwise the market price, or zero before any market data has arrived.
    pub fn reference_price(&self, market_price: Option<Decimal>) -> Figure {
        if self.uses_order_price() {
            Figure::from_input(&self.order_price)
        } else {
            Figure::new(market_price.unwrap_or(Decimal::ZERO))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pair: TradingPair,
    side: Side,
    order_type: OrderType,
    margin_type: MarginType,
    amount: Decimal,
    leverage: Leverage,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    order_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    trigger_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    take_profit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    stop_loss: Option<Decimal>,
    post_only: bool,
    timestamp: Timestamp,
}

impl OrderPayload {
    /// Only reachable through validation, which guarantees every field is in range.
    pub(crate) fn from_validated(
        draft: &OrderDraft,
        pair: TradingPair,
        amount: Decimal,
        leverage: Leverage,
        timestamp: Timestamp,
    ) -> Self {
        let order_price = if draft.order_type.has_order_price() {
            parse_decimal(&draft.order_price)
        } else {
            None
        };
        let trigger_price = if draft.order_type.has_trigger_price() {
            parse_decimal(&draft.trigger_price)
        } else {
            None
        };
        let (take_profit, stop_loss) = if draft.tp_sl_enabled {
            (parse_decimal(&draft.take_profit), parse_decimal(&draft.stop_loss))
        } else {
            (None, None)
        };

        Self {
            pair,
            side: draft.side,
            order_type: draft.order_type,
            margin_type: draft.margin_type,
            amount,
            leverage,
            order_price,
            trigger_price,
            take_profit,
            stop_loss,
            post_only: draft.post_only && draft.order_type == OrderType::Limit,
            timestamp,
        }
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn margin_type(&self) -> MarginType {
        self.margin_type
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn leverage(&self) -> Leverage {
        self.leverage
    }

    pub fn order_price(&self) -> Option<Decimal> {
        self.order_price
    }

    pub fn trigger_price(&self) -> Option<Decimal> {
        self.trigger_price
    }

    pub fn take_profit(&self) -> Option<Decimal> {
        self.take_profit
    }

    pub fn stop_loss(&self) -> Option<Decimal> {
        self.stop_loss
    }

    pub fn post_only(&self) -> bool {
        self.post_only
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// External handler for finalized orders. No execution backend ships with this crate.
pub trait OrderSink {
    fn submit(&mut self, payload: &OrderPayload);
}

/// Keeps every submitted payload, for tests and the demo.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub submitted: Vec<OrderPayload>,
}

impl OrderSink for RecordingSink {
    fn submit(&mut self, payload: &OrderPayload) {
        self.submitted.push(payload.clone());
    }
}
