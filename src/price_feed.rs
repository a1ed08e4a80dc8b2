// Price Feed Integration
//
// The form only needs one number from the outside world: the current price of the
// selected pair. QuoteSource abstracts where that comes from (the public HTTP API,
// or a scripted mock). QuotePoller refreshes it on a fixed interval and publishes
// the last good quote on a watch channel. A failed fetch is logged and dropped,
// and readers keep seeing the previous quote.

use crate::types::{default_pairs, TradingPair};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Quote for one pair as shown on the market banner. Only `price` feeds the calculators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub pair: TradingPair,
    pub price: Decimal,
    pub change_pct_24h: Decimal,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub supply: Option<Decimal>,
    /// Exchange or aggregate the quote came from, e.g. "CCCAGG".
    pub market: Option<String>,
}

impl MarketQuote {
    pub fn new(pair: TradingPair, price: Decimal, change_pct_24h: Decimal) -> Self {
        Self {
            pair,
            price,
            change_pct_24h,
            high_24h: None,
            low_24h: None,
            volume_24h: None,
            market_cap: None,
            supply: None,
            market: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.change_pct_24h >= Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteFeedConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Pairs offered for selection. The first one is selected on startup.
    pub pairs: Vec<TradingPair>,
}

impl Default for QuoteFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://min-api.cryptocompare.com/data".to_string(),
            api_key: None,
            poll_interval_secs: 30,
            request_timeout_secs: 10,
            pairs: default_pairs(),
        }
    }
}

impl QuoteFeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("quote api error: {0}")]
    Api(String),

    #[error("could not decode quote response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no quote for {0} in response")]
    MissingPair(TradingPair),

    #[error("non-positive price {price} for {pair}")]
    InvalidPrice { pair: TradingPair, price: Decimal },

    #[error("quote source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Human readable name, used in log lines
    fn name(&self) -> &str;

    async fn fetch_quote(&self, pair: &TradingPair) -> Result<MarketQuote, FeedError>;
}

#[derive(Debug, Default)]
struct MockState {
    prices: HashMap<TradingPair, (Decimal, Decimal)>,
    healthy: bool,
    calls: usize,
}

/// Scripted in-memory source for tests and the demo binary.
#[derive(Debug)]
pub struct MockQuoteSource {
    name: String,
    state: Mutex<MockState>,
}

impl MockQuoteSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(MockState {
                healthy: true,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        // a panicked test thread shouldn't wedge the mock for everyone else
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_price(&self, pair: &TradingPair, price: Decimal, change_pct_24h: Decimal) {
        self.state().prices.insert(pair.clone(), (price, change_pct_24h));
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state().healthy = healthy;
    }

    pub fn call_count(&self) -> usize {
        self.state().calls
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_quote(&self, pair: &TradingPair) -> Result<MarketQuote, FeedError> {
        let mut state = self.state();
        state.calls += 1;
        if !state.healthy {
            return Err(FeedError::Unavailable(self.name.clone()));
        }
        let (price, change) = state
            .prices
            .get(pair)
            .copied()
            .ok_or_else(|| FeedError::MissingPair(pair.clone()))?;
        Ok(MarketQuote::new(pair.clone(), price, change))
    }
}

/// Fetches on an interval and republishes the latest good quote.
pub struct QuotePoller<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: QuoteSource + 'static> QuotePoller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source: Arc::new(source),
            interval,
        }
    }

    pub fn from_shared(source: Arc<S>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// One fetch. Publishes on success. On failure logs and leaves `latest` untouched.
    /// Returns whether a new quote was published.
    pub async fn poll_once(
        &self,
        pair: &TradingPair,
        latest: &watch::Sender<Option<MarketQuote>>,
    ) -> bool {
        fetch_into(self.source.as_ref(), pair, latest).await
    }

    pub fn spawn(self, initial_pair: TradingPair) -> PollerHandle {
        let (quote_tx, quote_rx) = watch::channel(None);
        let (pair_tx, pair_rx) = watch::channel(initial_pair);
        let task = tokio::spawn(run_poller(self.source, self.interval, pair_rx, quote_tx));

        PollerHandle {
            quotes: quote_rx,
            pair_tx,
            task,
        }
    }
}

async fn fetch_into<S: QuoteSource + ?Sized>(
    source: &S,
    pair: &TradingPair,
    latest: &watch::Sender<Option<MarketQuote>>,
) -> bool {
    match source.fetch_quote(pair).await {
        Ok(quote) if quote.price > Decimal::ZERO => {
            log::debug!("{}: {} @ {}", source.name(), pair, quote.price);
            latest.send_replace(Some(quote));
            true
        }
        Ok(quote) => {
            log::warn!(
                "{}: ignoring non-positive price {} for {}",
                source.name(),
                quote.price,
                pair
            );
            false
        }
        Err(err) => {
            log::warn!("{}: quote fetch for {} failed, keeping last price: {}", source.name(), pair, err);
            false
        }
    }
}

async fn run_poller<S: QuoteSource + 'static>(
    source: Arc<S>,
    interval: Duration,
    mut pair_rx: watch::Receiver<TradingPair>,
    quote_tx: watch::Sender<Option<MarketQuote>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // first tick completes immediately
            _ = ticker.tick() => {}
            changed = pair_rx.changed() => {
                if changed.is_err() {
                    // handle dropped
                    break;
                }
                ticker.reset();
            }
        }

        let pair = pair_rx.borrow_and_update().clone();
        fetch_into(source.as_ref(), &pair, &quote_tx).await;
    }

    log::debug!("{}: poller stopped", source.name());
}

/// Owner side of a running poller. Dropping it stops the task.
pub struct PollerHandle {
    quotes: watch::Receiver<Option<MarketQuote>>,
    pair_tx: watch::Sender<TradingPair>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn latest(&self) -> Option<MarketQuote> {
        self.quotes.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<MarketQuote>> {
        self.quotes.clone()
    }

    /// Waits until a new quote is published. Returns None once the poller has stopped.
    pub async fn next_quote(&mut self) -> Option<MarketQuote> {
        self.quotes.changed().await.ok()?;
        self.quotes.borrow_and_update().clone()
    }

    /// Switches the polled pair and triggers an immediate fetch.
    pub fn select_pair(&self, pair: TradingPair) {
        log::info!("quote poller switching to {}", pair);
        self.pair_tx.send_replace(pair);
    }

    pub fn selected_pair(&self) -> TradingPair {
        self.pair_tx.borrow().clone()
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
