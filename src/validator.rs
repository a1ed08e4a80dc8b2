//! Pre-submission checks on an order draft.
//!
//! Checks run in a fixed order and the first failure is the one reported:
//! pair, amount, leverage, order price, trigger price, then take-profit and
//! stop-loss placement relative to the reference price.

use crate::order::{OrderDraft, OrderPayload};
use crate::types::{parse_decimal, Leverage, Side, Timestamp, TradingPair};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("Please select a trading pair")]
    NoPairSelected,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Leverage must be at least 1x")]
    InvalidLeverage,

    #[error("Maximum leverage is {max}")]
    LeverageAboveMax { max: Leverage },

    #[error("Please enter a valid order price")]
    InvalidOrderPrice,

    #[error("Please enter a valid trigger price")]
    InvalidTriggerPrice,

    #[error("Take Profit must be higher than entry price for long positions")]
    LongTakeProfitNotAbove,

    #[error("Stop Loss must be lower than entry price for long positions")]
    LongStopLossNotBelow,

    #[error("Take Profit must be lower than entry price for short positions")]
    ShortTakeProfitNotBelow,

    #[error("Stop Loss must be higher than entry price for short positions")]
    ShortStopLossNotAbove,
}

fn positive(input: &str) -> Option<Decimal> {
    parse_decimal(input).filter(|v| *v > Decimal::ZERO)
}

// empty field = not set, skip. a non-empty field that does not parse fails the comparison.
fn placement_holds(input: &str, holds: impl Fn(Decimal) -> bool) -> bool {
    if input.trim().is_empty() {
        return true;
    }
    parse_decimal(input).map_or(false, holds)
}

fn check_tp_sl(draft: &OrderDraft, market_price: Option<Decimal>) -> Result<(), RejectReason> {
    if !draft.tp_sl_enabled {
        return Ok(());
    }

    // the order price has already passed its own check when it is in use
    let reference = draft
        .reference_price(market_price)
        .value()
        .unwrap_or(Decimal::ZERO);

    match draft.side {
        Side::Long => {
            if !placement_holds(&draft.take_profit, |tp| tp > reference) {
                return Err(RejectReason::LongTakeProfitNotAbove);
            }
            if !placement_holds(&draft.stop_loss, |sl| sl < reference) {
                return Err(RejectReason::LongStopLossNotBelow);
            }
        }
        Side::Short => {
            if !placement_holds(&draft.take_profit, |tp| tp < reference) {
                return Err(RejectReason::ShortTakeProfitNotBelow);
            }
            if !placement_holds(&draft.stop_loss, |sl| sl > reference) {
                return Err(RejectReason::ShortStopLossNotAbove);
            }
        }
    }

    Ok(())
}

/// Runs every check and, when all pass, assembles the payload stamped with `timestamp`.
pub fn validate_order(
    draft: &OrderDraft,
    pair: Option<&TradingPair>,
    market_price: Option<Decimal>,
    timestamp: Timestamp,
) -> Result<OrderPayload, RejectReason> {
    run_checks(draft, pair, market_price, None, timestamp)
}

/// Same checks as [`validate_order`], plus leverage must not exceed `max_leverage`.
pub fn validate_order_within(
    draft: &OrderDraft,
    pair: Option<&TradingPair>,
    market_price: Option<Decimal>,
    max_leverage: Leverage,
    timestamp: Timestamp,
) -> Result<OrderPayload, RejectReason> {
    run_checks(draft, pair, market_price, Some(max_leverage), timestamp)
}

fn run_checks(
    draft: &OrderDraft,
    pair: Option<&TradingPair>,
    market_price: Option<Decimal>,
    max_leverage: Option<Leverage>,
    timestamp: Timestamp,
) -> Result<OrderPayload, RejectReason> {
    let pair = pair
        .filter(|p| p.has_base())
        .ok_or(RejectReason::NoPairSelected)?;

    let amount = positive(&draft.amount).ok_or(RejectReason::InvalidAmount)?;

    let leverage = parse_decimal(&draft.leverage)
        .and_then(Leverage::new)
        .ok_or(RejectReason::InvalidLeverage)?;

    if let Some(max) = max_leverage.filter(|max| leverage > *max) {
        return Err(RejectReason::LeverageAboveMax { max });
    }

    if draft.order_type.has_order_price() && positive(&draft.order_price).is_none() {
        return Err(RejectReason::InvalidOrderPrice);
    }

    if draft.order_type.has_trigger_price() && positive(&draft.trigger_price).is_none() {
        return Err(RejectReason::InvalidTriggerPrice);
    }

    check_tp_sl(draft, market_price)?;

    Ok(OrderPayload::from_validated(
        draft,
        pair.clone(),
        amount,
        leverage,
        timestamp,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderType;
    use rust_decimal_macros::dec;

    fn btc() -> TradingPair {
        TradingPair::new("BTC", "USDT")
    }

    fn check(draft: &OrderDraft) -> Result<OrderPayload, RejectReason> {
        validate_order(draft, Some(&btc()), Some(dec!(45000)), Timestamp::from_millis(0))
    }

    #[test]
    fn accepts_basic_market_order() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5");
        let payload = check(&draft).unwrap();

        assert_eq!(payload.amount(), dec!(100));
        assert_eq!(payload.leverage().value(), dec!(5));
        assert_eq!(payload.pair(), &btc());
    }

    #[test]
    fn rejects_bad_amounts() {
        for amount in ["0", "-5", "abc", ""] {
            let draft = OrderDraft::new(Side::Long, OrderType::Market)
                .with_amount(amount)
                .with_leverage("5");
            let reason = check(&draft).unwrap_err();
            assert_eq!(reason, RejectReason::InvalidAmount);
            assert!(!reason.to_string().is_empty());
        }
    }

    #[test]
    fn rejects_missing_pair() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5");
        let result = validate_order(&draft, None, Some(dec!(45000)), Timestamp::from_millis(0));
        assert_eq!(result.unwrap_err(), RejectReason::NoPairSelected);

        let blank = TradingPair::new("", "USDT");
        let result = validate_order(&draft, Some(&blank), Some(dec!(45000)), Timestamp::from_millis(0));
        assert_eq!(result.unwrap_err(), RejectReason::NoPairSelected);
    }

    #[test]
    fn pair_check_runs_before_amount() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market).with_amount("abc");
        let result = validate_order(&draft, None, None, Timestamp::from_millis(0));
        assert_eq!(result.unwrap_err(), RejectReason::NoPairSelected);
    }

    #[test]
    fn rejects_leverage_below_one() {
        for leverage in ["0.5", "0", "", "x"] {
            let draft = OrderDraft::new(Side::Long, OrderType::Market)
                .with_amount("100")
                .with_leverage(leverage);
            assert_eq!(check(&draft).unwrap_err(), RejectReason::InvalidLeverage);
        }
    }

    #[test]
    fn limit_needs_order_price() {
        let draft = OrderDraft::new(Side::Long, OrderType::Limit)
            .with_amount("100")
            .with_leverage("5");
        assert_eq!(check(&draft).unwrap_err(), RejectReason::InvalidOrderPrice);

        let priced = draft.with_order_price("44000");
        assert_eq!(check(&priced).unwrap().order_price(), Some(dec!(44000)));
    }

    #[test]
    fn stop_needs_trigger_price() {
        let draft = OrderDraft::new(Side::Short, OrderType::Stop)
            .with_amount("1")
            .with_leverage("2")
            .with_order_price("44000");
        assert_eq!(check(&draft).unwrap_err(), RejectReason::InvalidTriggerPrice);

        let triggered = draft.with_trigger_price("44100");
        let payload = check(&triggered).unwrap();
        assert_eq!(payload.trigger_price(), Some(dec!(44100)));
    }

    #[test]
    fn long_stop_loss_above_entry_rejected() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5")
            .with_tp_sl("", "46000");
        let reason = check(&draft).unwrap_err();
        assert_eq!(reason, RejectReason::LongStopLossNotBelow);
        assert_eq!(
            reason.to_string(),
            "Stop Loss must be lower than entry price for long positions"
        );
    }

    #[test]
    fn long_take_profit_below_entry_rejected() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5")
            .with_tp_sl("44000", "43000");
        assert_eq!(check(&draft).unwrap_err(), RejectReason::LongTakeProfitNotAbove);
    }

    #[test]
    fn short_placement_inverts() {
        let good = OrderDraft::new(Side::Short, OrderType::Market)
            .with_amount("100")
            .with_leverage("5")
            .with_tp_sl("40000", "47000");
        let payload = check(&good).unwrap();
        assert_eq!(payload.take_profit(), Some(dec!(40000)));
        assert_eq!(payload.stop_loss(), Some(dec!(47000)));

        let bad_tp = good.clone().with_tp_sl("46000", "47000");
        assert_eq!(check(&bad_tp).unwrap_err(), RejectReason::ShortTakeProfitNotBelow);

        let bad_sl = good.with_tp_sl("40000", "44000");
        assert_eq!(check(&bad_sl).unwrap_err(), RejectReason::ShortStopLossNotAbove);
    }

    #[test]
    fn tp_sl_uses_limit_price_as_reference() {
        // 44500 is below market but above the 44000 limit price
        let draft = OrderDraft::new(Side::Long, OrderType::Limit)
            .with_amount("100")
            .with_leverage("5")
            .with_order_price("44000")
            .with_tp_sl("44500", "43000");
        assert!(check(&draft).is_ok());
    }

    #[test]
    fn tp_sl_disabled_ignores_fields() {
        let mut draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5")
            .with_tp_sl("1", "99999");
        draft.tp_sl_enabled = false;
        let payload = check(&draft).unwrap();
        assert_eq!(payload.take_profit(), None);
        assert_eq!(payload.stop_loss(), None);
    }

    #[test]
    fn no_market_data_reference_is_zero() {
        let empty = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5")
            .with_tp_sl("", "");
        let ok = validate_order(&empty, Some(&btc()), None, Timestamp::from_millis(0));
        assert!(ok.is_ok());

        // stop loss has to be below 0 for a long, which a price never is
        let with_sl = empty.with_tp_sl("", "100");
        let rejected = validate_order(&with_sl, Some(&btc()), None, Timestamp::from_millis(0));
        assert_eq!(rejected.unwrap_err(), RejectReason::LongStopLossNotBelow);
    }

    #[test]
    fn unparsable_take_profit_fails_placement() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("5")
            .with_tp_sl("soon", "");
        assert_eq!(check(&draft).unwrap_err(), RejectReason::LongTakeProfitNotAbove);
    }

    #[test]
    fn ceiling_rejects_leverage_above_max() {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("100")
            .with_leverage("500");
        let max = Leverage::new(dec!(100)).unwrap();

        let result = validate_order_within(&draft, Some(&btc()), Some(dec!(45000)), max, Timestamp::from_millis(0));
        let reason = result.unwrap_err();
        assert_eq!(reason, RejectReason::LeverageAboveMax { max });
        assert_eq!(reason.to_string(), "Maximum leverage is 100x");

        // at the ceiling is fine
        let at_max = draft.with_leverage("100");
        assert!(validate_order_within(&at_max, Some(&btc()), Some(dec!(45000)), max, Timestamp::from_millis(0)).is_ok());
    }
}
