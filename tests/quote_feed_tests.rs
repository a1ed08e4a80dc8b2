//! Quote poller behaviour against a scripted source.
//!
//! Time is paused, so interval ticks advance instantly once every task is idle.

use order_desk::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn btc() -> TradingPair {
    TradingPair::new("BTC", "USDT")
}

fn eth() -> TradingPair {
    TradingPair::new("ETH", "USDT")
}

fn scripted() -> Arc<MockQuoteSource> {
    let source = Arc::new(MockQuoteSource::new("scripted"));
    source.set_price(&btc(), dec!(45000), dec!(1.5));
    source.set_price(&eth(), dec!(3000), dec!(-0.4));
    source
}

#[tokio::test(start_paused = true)]
async fn fetches_immediately_on_start() {
    let source = scripted();
    let mut handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());

    let start = Instant::now();
    let quote = handle.next_quote().await.unwrap();
    assert_eq!(quote.price, dec!(45000));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(handle.latest(), Some(quote));
}

#[tokio::test(start_paused = true)]
async fn refreshes_every_interval() {
    let source = scripted();
    let mut handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());
    handle.next_quote().await.unwrap();

    source.set_price(&btc(), dec!(46000), dec!(2));
    let start = Instant::now();
    let quote = handle.next_quote().await.unwrap();

    assert_eq!(quote.price, dec!(46000));
    assert!(start.elapsed() >= Duration::from_secs(29));
}

#[tokio::test(start_paused = true)]
async fn pair_change_refetches_without_waiting() {
    let source = scripted();
    let mut handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());
    handle.next_quote().await.unwrap();

    let start = Instant::now();
    handle.select_pair(eth());
    let quote = handle.next_quote().await.unwrap();

    assert_eq!(quote.pair, eth());
    assert_eq!(handle.selected_pair(), eth());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn outage_keeps_last_quote() {
    let source = scripted();
    let mut handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());
    handle.next_quote().await.unwrap();

    source.set_healthy(false);
    let calls_before = source.call_count();
    tokio::time::sleep(Duration::from_secs(95)).await;

    assert!(source.call_count() > calls_before);
    assert_eq!(handle.latest().map(|q| q.price), Some(dec!(45000)));

    source.set_healthy(true);
    source.set_price(&btc(), dec!(44000), dec!(-2));
    let quote = handle.next_quote().await.unwrap();
    assert_eq!(quote.price, dec!(44000));
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_updates() {
    let source = scripted();
    let handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());
    let mut rx = handle.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().as_ref().map(|q| q.price), Some(dec!(45000)));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling() {
    let source = scripted();
    let mut handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());
    handle.next_quote().await.unwrap();

    handle.shutdown();
    tokio::task::yield_now().await;
    let calls = source.call_count();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(source.call_count(), calls);
}

#[tokio::test(start_paused = true)]
async fn poller_drives_the_form() {
    let source = scripted();
    let mut handle = QuotePoller::from_shared(Arc::clone(&source), Duration::from_secs(30)).spawn(btc());
    let mut form = OrderFormController::with_config(DeskConfig::default());
    form.set_amount("1000");
    form.set_leverage("10");

    let quote = handle.next_quote().await.unwrap();
    assert!(form.apply_quote(&quote));
    assert_eq!(form.metrics().metrics.liquidation_price.value(), Some(dec!(40747.5)));

    form.select_pair(eth());
    handle.select_pair(eth());
    let quote = handle.next_quote().await.unwrap();
    assert!(form.apply_quote(&quote));
    // 3000 * (1 - 0.1 + 0.0055)
    assert_eq!(form.metrics().metrics.liquidation_price.value(), Some(dec!(2716.5)));
}
