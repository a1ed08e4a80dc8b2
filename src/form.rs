// 15.0 form.rs: order form controller. owns the draft, the selected pair, the last
// known market price, and the notification queue. every setter re-runs the metrics
// pipeline so the displayed figures never lag the inputs.
// 15.1 place_order validates, hands the payload to the sink, and reports back through
// notifications. a rejected order leaves the form exactly as it was.
// 15.6 the selected pair survives restarts through an optional encrypted PairStore.

use crate::account::{AccountSource, FixedAccount};
use crate::config::DeskConfig;
use crate::margin::{check_leverage, LeverageCheck};
use crate::metrics::{derive_metrics, RiskView};
use crate::notifications::{Notification, NotificationLevel, NotificationQueue};
use crate::order::{OrderDraft, OrderPayload, OrderSink};
use crate::pair_store::PairStore;
use crate::price_feed::MarketQuote;
use crate::types::{parse_decimal, MarginType, OrderType, Side, Timestamp, TradingPair};
use crate::validator::{validate_order_within, RejectReason};
use rust_decimal::Decimal;

/** 15.0: controller struct. single owner, driven through &mut self */
pub struct OrderFormController {
    draft: OrderDraft,
    selected_pair: Option<TradingPair>,
    market_price: Option<Decimal>,
    config: DeskConfig,
    account: Box<dyn AccountSource>,
    sink: Option<Box<dyn OrderSink>>,
    pair_store: Option<PairStore>,
    notifications: NotificationQueue,
    view: RiskView,
}

impl OrderFormController {
    pub fn new(config: DeskConfig, account: Box<dyn AccountSource>) -> Self {
        let mut controller = Self {
            draft: OrderDraft::new(Side::Long, OrderType::Market).with_leverage("1"),
            selected_pair: config.initial_pair().cloned(),
            market_price: None,
            config,
            account,
            sink: None,
            pair_store: None,
            notifications: NotificationQueue::default(),
            view: RiskView::default(),
        };
        controller.recompute();
        controller
    }

    /// Controller over the illustrative wallet from `config.account`.
    pub fn with_config(config: DeskConfig) -> Self {
        let account = FixedAccount::from_config(&config.account);
        Self::new(config, Box::new(account))
    }

    pub fn with_sink(mut self, sink: Box<dyn OrderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Restores the stored pair if it is one of the configured pairs, otherwise keeps the
    /// first configured pair. Later pair changes are written back to the store.
    pub fn with_pair_store(mut self, store: PairStore) -> Self {
        match store.load() {
            Some(pair) if self.config.quote_feed.pairs.contains(&pair) => {
                log::info!("restored selected pair {}", pair);
                self.selected_pair = Some(pair);
                self.market_price = None;
                self.recompute();
            }
            Some(pair) => log::warn!("stored pair {} is not offered, keeping default", pair),
            None => {}
        }
        self.pair_store = Some(store);
        self
    }

    fn recompute(&mut self) {
        self.view = derive_metrics(
            &self.draft,
            self.market_price,
            self.account.as_ref(),
            &self.config,
        );
        log::debug!(
            "recomputed {} {} draft: commission={} liq={} margin={}",
            self.draft.side,
            self.draft.order_type,
            self.view.metrics.commission,
            self.view.metrics.liquidation_price,
            self.view.metrics.required_margin
        );
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications
            .push(Notification::new(level, message, Timestamp::now()));
    }

    // 15.2: input setters

    pub fn set_side(&mut self, side: Side) {
        self.draft.side = side;
        self.recompute();
    }

    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.draft.order_type = order_type;
        self.recompute();
    }

    pub fn set_margin_type(&mut self, margin_type: MarginType) {
        self.draft.margin_type = margin_type;
        self.recompute();
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.draft.amount = amount.to_string();
        self.recompute();
    }

    /// Values above the configured ceiling are replaced by the ceiling and a warning is queued.
    pub fn set_leverage(&mut self, leverage: &str) {
        self.apply_leverage(leverage);
        self.recompute();
    }

    fn apply_leverage(&mut self, leverage: &str) {
        // numbers too large for Decimal still count as above the ceiling
        let requested = parse_decimal(leverage)
            .or_else(|| exceeds_decimal_range(leverage).then_some(Decimal::MAX));
        let clamped = requested.map(|value| check_leverage(value, &self.config.margin));

        match clamped {
            Some(LeverageCheck::Clamped { max, .. }) => {
                log::warn!("leverage {} clamped to {}", leverage.trim(), max);
                self.draft.leverage = max.value().normalize().to_string();
                self.notify(
                    NotificationLevel::Warning,
                    format!("Maximum leverage is {}", max),
                );
            }
            _ => self.draft.leverage = leverage.to_string(),
        }
    }

    pub fn set_order_price(&mut self, price: &str) {
        self.draft.order_price = price.to_string();
        self.recompute();
    }

    pub fn set_trigger_price(&mut self, price: &str) {
        self.draft.trigger_price = price.to_string();
        self.recompute();
    }

    pub fn set_take_profit(&mut self, price: &str) {
        self.draft.take_profit = price.to_string();
        self.recompute();
    }

    pub fn set_stop_loss(&mut self, price: &str) {
        self.draft.stop_loss = price.to_string();
        self.recompute();
    }

    pub fn set_tp_sl_enabled(&mut self, enabled: bool) {
        self.draft.tp_sl_enabled = enabled;
        self.recompute();
    }

    pub fn set_post_only(&mut self, post_only: bool) {
        self.draft.post_only = post_only;
        self.recompute();
    }

    /// Replaces the whole draft at once, e.g. when restoring a saved form.
    /// Leverage in the loaded draft goes through the same ceiling as `set_leverage`.
    pub fn load_draft(&mut self, draft: OrderDraft) {
        let leverage = draft.leverage.clone();
        self.draft = draft;
        self.apply_leverage(&leverage);
        self.recompute();
    }

    // 15.3: market data

    /// Switching pairs drops the old pair's price until a fresh quote arrives.
    pub fn select_pair(&mut self, pair: TradingPair) {
        if self.selected_pair.as_ref() == Some(&pair) {
            return;
        }
        log::info!("selected pair {}", pair);
        if let Some(store) = self.pair_store.as_mut() {
            if let Err(err) = store.save(&pair) {
                log::warn!("could not persist selected pair {}: {}", pair, err);
            }
        }
        self.selected_pair = Some(pair);
        self.market_price = None;
        self.recompute();
    }

    pub fn clear_pair(&mut self) {
        self.selected_pair = None;
        self.market_price = None;
        self.recompute();
    }

    /// Quotes for any pair other than the selected one are ignored. Returns whether it applied.
    pub fn apply_quote(&mut self, quote: &MarketQuote) -> bool {
        if self.selected_pair.as_ref() != Some(&quote.pair) {
            log::debug!("ignoring quote for unselected pair {}", quote.pair);
            return false;
        }
        self.set_market_price(quote.price);
        true
    }

    pub fn set_market_price(&mut self, price: Decimal) {
        self.market_price = Some(price);
        self.recompute();
    }

    // 15.4: submission

    pub fn place_order(&mut self) -> Result<OrderPayload, RejectReason> {
        self.place_order_at(Timestamp::now())
    }

    pub fn place_order_at(&mut self, timestamp: Timestamp) -> Result<OrderPayload, RejectReason> {
        let result = validate_order_within(
            &self.draft,
            self.selected_pair.as_ref(),
            self.market_price,
            self.config.margin.max_leverage,
            timestamp,
        );

        match result {
            Ok(payload) => {
                if let Some(sink) = self.sink.as_mut() {
                    sink.submit(&payload);
                }
                log::info!(
                    "order placed: {} {} {} {} @ {}",
                    payload.pair(),
                    payload.side(),
                    payload.order_type(),
                    payload.amount(),
                    payload.leverage()
                );
                self.notify(
                    NotificationLevel::Success,
                    format!(
                        "{} {} order placed",
                        capitalize(&payload.side().to_string()),
                        payload.order_type()
                    ),
                );
                Ok(payload)
            }
            Err(reason) => {
                log::info!("order rejected: {}", reason);
                self.notify(NotificationLevel::Error, reason.to_string());
                Err(reason)
            }
        }
    }

    // 15.5: accessors

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn selected_pair(&self) -> Option<&TradingPair> {
        self.selected_pair.as_ref()
    }

    pub fn market_price(&self) -> Option<Decimal> {
        self.market_price
    }

    pub fn metrics(&self) -> &RiskView {
        &self.view
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn available_pairs(&self) -> &[TradingPair] {
        &self.config.quote_feed.pairs
    }

    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }
}

fn exceeds_decimal_range(input: &str) -> bool {
    input
        .trim()
        .parse::<f64>()
        .map_or(false, |value| value.is_finite() && value > 1.0)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct SharedSink(Rc<RefCell<Vec<OrderPayload>>>);

    impl OrderSink for SharedSink {
        fn submit(&mut self, payload: &OrderPayload) {
            self.0.borrow_mut().push(payload.clone());
        }
    }

    fn btc() -> TradingPair {
        TradingPair::new("BTC", "USDT")
    }

    fn controller() -> OrderFormController {
        let account = FixedAccount::new(dec!(10000), dec!(10000), dec!(6_000_000));
        let mut form = OrderFormController::new(DeskConfig::default(), Box::new(account));
        form.set_market_price(dec!(45000));
        form
    }

    #[test]
    fn starts_on_first_configured_pair() {
        let form = OrderFormController::with_config(DeskConfig::default());
        assert_eq!(form.selected_pair(), Some(&btc()));
        assert_eq!(form.market_price(), None);
        assert_eq!(form.draft().leverage, "1");
    }

    #[test]
    fn setters_recompute_metrics() {
        let mut form = controller();
        form.set_amount("1000");
        form.set_leverage("10");

        assert_eq!(form.metrics().metrics.required_margin.value(), Some(dec!(100)));
        assert_eq!(form.metrics().metrics.liquidation_price.value(), Some(dec!(40747.5)));

        form.set_side(Side::Short);
        assert_eq!(form.metrics().metrics.liquidation_price.value(), Some(dec!(49252.5)));
    }

    #[test]
    fn leverage_above_max_is_clamped_with_warning() {
        let mut form = controller();
        form.set_leverage("250");

        assert_eq!(form.draft().leverage, "100");
        let notes = form.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Warning);
        assert_eq!(notes[0].message, "Maximum leverage is 100x");
    }

    #[test]
    fn leverage_within_limit_kept_verbatim() {
        let mut form = controller();
        form.set_leverage("12.5");
        assert_eq!(form.draft().leverage, "12.5");
        assert_eq!(form.pending_notifications(), 0);
    }

    #[test]
    fn quote_for_other_pair_ignored() {
        let mut form = controller();
        let eth = MarketQuote::new(TradingPair::new("ETH", "USDT"), dec!(3000), dec!(0));
        assert!(!form.apply_quote(&eth));
        assert_eq!(form.market_price(), Some(dec!(45000)));

        let btc_quote = MarketQuote::new(btc(), dec!(46000), dec!(1));
        assert!(form.apply_quote(&btc_quote));
        assert_eq!(form.market_price(), Some(dec!(46000)));
    }

    #[test]
    fn select_pair_drops_stale_price() {
        let mut form = controller();
        form.select_pair(TradingPair::new("ETH", "USDT"));
        assert_eq!(form.market_price(), None);

        // reselecting the same pair is a no-op
        form.set_market_price(dec!(3000));
        form.select_pair(TradingPair::new("ETH", "USDT"));
        assert_eq!(form.market_price(), Some(dec!(3000)));
    }

    #[test]
    fn successful_order_reaches_sink() {
        let sink = SharedSink::default();
        let mut form = controller().with_sink(Box::new(sink.clone()));
        form.set_amount("1000");
        form.set_leverage("10");

        let payload = form.place_order_at(Timestamp::from_millis(42)).unwrap();
        assert_eq!(payload.timestamp(), Timestamp::from_millis(42));
        assert_eq!(sink.0.borrow().len(), 1);

        let notes = form.drain_notifications();
        assert_eq!(notes[0].level, NotificationLevel::Success);
        assert_eq!(notes[0].message, "Long market order placed");
    }

    #[test]
    fn rejected_order_leaves_state_alone() {
        let sink = SharedSink::default();
        let mut form = controller().with_sink(Box::new(sink.clone()));
        form.set_amount("0");
        let before = form.draft().clone();
        let view_before = *form.metrics();

        let result = form.place_order();
        assert_eq!(result.unwrap_err(), RejectReason::InvalidAmount);
        assert_eq!(form.draft(), &before);
        assert_eq!(form.metrics(), &view_before);
        assert!(sink.0.borrow().is_empty());

        let notes = form.drain_notifications();
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "Please enter a valid amount");
    }

    #[test]
    fn no_pair_rejected() {
        let mut form = controller();
        form.set_amount("1");
        form.clear_pair();
        assert_eq!(form.place_order().unwrap_err(), RejectReason::NoPairSelected);
    }

    #[test]
    fn overflowing_leverage_is_clamped() {
        let mut form = controller();
        form.set_leverage("1e30");

        assert_eq!(form.draft().leverage, "100");
        let notes = form.drain_notifications();
        assert_eq!(notes[0].message, "Maximum leverage is 100x");
    }

    #[test]
    fn garbage_leverage_kept_as_typed() {
        let mut form = controller();
        form.set_leverage("ten");
        assert_eq!(form.draft().leverage, "ten");
        assert_eq!(form.pending_notifications(), 0);
        assert!(!exceeds_decimal_range("ten"));
        assert!(!exceeds_decimal_range("-1e30"));
        assert!(!exceeds_decimal_range("inf"));
    }

    #[test]
    fn capitalize_side() {
        assert_eq!(capitalize("short"), "Short");
        assert_eq!(capitalize(""), "");
    }
}
