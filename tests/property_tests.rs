//! Property-based tests for the order form calculators.
//!
//! These tests verify invariants hold under random inputs.

use order_desk::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $0.01 to $100,000
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|x| Decimal::new(x, 4)) // 0.0001 to 10,000
}

fn leverage_strategy() -> impl Strategy<Value = Leverage> {
    // below 100x the liquidation cushion stays positive at the default base rate
    (100u32..10_000u32).prop_map(|x| Leverage::effective(Some(Decimal::new(x as i64, 2))))
}

fn volume_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..50_000_000i64).prop_map(Decimal::from)
}

fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(Decimal::from)
}

proptest! {
    /// Long liquidation sits below the entry price, short liquidation above it
    #[test]
    fn liquidation_brackets_entry(
        entry in price_strategy(),
        leverage in leverage_strategy(),
    ) {
        let params = LiquidationParams::default();
        let entry_figure = Figure::new(entry);

        let long = calculate_liquidation_price(entry_figure, leverage, Side::Long, &params)
            .value()
            .unwrap();
        let short = calculate_liquidation_price(entry_figure, leverage, Side::Short, &params)
            .value()
            .unwrap();

        prop_assert!(long < entry, "long liq {} not below {}", long, entry);
        prop_assert!(entry < short, "short liq {} not above {}", short, entry);
    }

    /// More volume never makes the fee rate go up
    #[test]
    fn commission_rate_non_increasing(
        a in volume_strategy(),
        b in volume_strategy(),
    ) {
        let schedule = CommissionSchedule::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(commission_rate(high, &schedule) <= commission_rate(low, &schedule));
    }

    /// Commission never exceeds notional times the base rate
    #[test]
    fn commission_bounded_by_base_rate(
        amount in amount_strategy(),
        price in price_strategy(),
        volume in volume_strategy(),
    ) {
        let schedule = CommissionSchedule::default();
        let fee = estimate_commission(Figure::new(amount), Figure::new(price), volume, &schedule)
            .value()
            .unwrap();
        prop_assert!(fee >= Decimal::ZERO);
        prop_assert!(fee <= amount * price * schedule.base_rate);
    }

    /// Required margin times leverage gives back the amount
    #[test]
    fn required_margin_round_trips(
        amount in amount_strategy(),
        leverage in leverage_strategy(),
    ) {
        let margin = required_margin(Figure::new(amount), leverage).value().unwrap();
        let back = margin * leverage.value();

        // division rounds at the 28th significant digit
        let tolerance = amount * Decimal::new(1, 20);
        prop_assert!((back - amount).abs() <= tolerance, "{} * {} = {}", margin, leverage, back);
    }

    /// Higher leverage never shrinks the maximum position
    #[test]
    fn max_position_non_decreasing(
        balance in balance_strategy(),
        a in leverage_strategy(),
        b in leverage_strategy(),
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let small = max_position_amount(balance, low).value().unwrap();
        let large = max_position_amount(balance, high).value().unwrap();
        prop_assert!(small <= large);
    }

    /// Leverage under 1x, zero, or negative behaves like 1x in every calculator
    #[test]
    fn sub_one_leverage_floors(raw in -1000i64..100i64) {
        let input = Decimal::new(raw, 2).to_string();
        prop_assert_eq!(Leverage::from_input(&input), Leverage::ONE);
    }

    /// Any positive amount with valid leverage passes on a market order
    #[test]
    fn valid_market_orders_accepted(
        amount in amount_strategy(),
        leverage in 1u32..=100u32,
        price in price_strategy(),
    ) {
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount(&amount.to_string())
            .with_leverage(&leverage.to_string());
        let pair = TradingPair::new("BTC", "USDT");

        let payload = validate_order(&draft, Some(&pair), Some(price), Timestamp::from_millis(0));
        prop_assert!(payload.is_ok());
        prop_assert_eq!(payload.unwrap().amount(), amount);
    }

    /// Non-positive amounts are always rejected
    #[test]
    fn non_positive_amounts_rejected(raw in -1_000_000i64..=0i64) {
        let draft = OrderDraft::new(Side::Short, OrderType::Market)
            .with_amount(&Decimal::new(raw, 2).to_string())
            .with_leverage("5");
        let pair = TradingPair::new("BTC", "USDT");

        let result = validate_order(&draft, Some(&pair), Some(dec!(45000)), Timestamp::from_millis(0));
        prop_assert_eq!(result.unwrap_err(), RejectReason::InvalidAmount);
    }

    /// Long stop loss at or above the reference price is rejected
    #[test]
    fn long_stop_loss_must_be_below(
        reference in price_strategy(),
        above in 0i64..1_000_000i64,
    ) {
        let sl = reference + Decimal::new(above, 2);
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount("1")
            .with_leverage("10")
            .with_tp_sl("", &sl.to_string());
        let pair = TradingPair::new("BTC", "USDT");

        let result = validate_order(&draft, Some(&pair), Some(reference), Timestamp::from_millis(0));
        prop_assert_eq!(result.unwrap_err(), RejectReason::LongStopLossNotBelow);
    }

    /// The recompute pipeline is a pure function of its inputs
    #[test]
    fn derive_metrics_deterministic(
        amount in amount_strategy(),
        price in price_strategy(),
        leverage in 1u32..=100u32,
        volume in volume_strategy(),
    ) {
        let config = DeskConfig::default();
        let account = FixedAccount::new(dec!(10000), dec!(10000), volume);
        let draft = OrderDraft::new(Side::Long, OrderType::Market)
            .with_amount(&amount.to_string())
            .with_leverage(&leverage.to_string());

        let first = derive_metrics(&draft, Some(price), &account, &config);
        let second = derive_metrics(&draft, Some(price), &account, &config);
        prop_assert_eq!(first, second);
        prop_assert!(first.metrics.all_valid());
    }
}

#[test]
fn liquidation_reference_value() {
    let price = calculate_liquidation_price(
        Figure::new(dec!(45000)),
        Leverage::effective(Some(dec!(10))),
        Side::Long,
        &LiquidationParams::default(),
    );
    assert_eq!(price.value(), Some(dec!(40747.5)));
}

#[test]
fn commission_reference_value() {
    let fee = estimate_commission(
        Figure::new(dec!(1000)),
        Figure::new(dec!(100)),
        dec!(6_000_000),
        &CommissionSchedule::default(),
    );
    assert_eq!(fee.value(), Some(dec!(60)));
}
