//! Order desk simulation.
//!
//! Walks the order form through commission tiers, liquidation pricing, margin
//! sizing, validation, the quote poller and pair persistence. Pass `--live` to poll the configured
//! quote endpoint and recompute a draft against real prices.

use order_desk::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let live = std::env::args().any(|arg| arg == "--live");

    println!("Order Desk Simulation");
    println!("Commission, Liquidation, Margin, Validation\n");

    scenario_1_commission_tiers();
    scenario_2_liquidation_prices();
    scenario_3_margin_sizing();
    scenario_4_validation();
    scenario_5_take_profit_stop_loss();
    scenario_6_mock_quote_feed();
    scenario_7_pair_persistence();

    if live {
        scenario_8_live_quotes();
    }

    println!("\nAll simulations completed successfully.");
}

fn btc() -> TradingPair {
    TradingPair::new("BTC", "USDT")
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Fee rate falls as trailing volume crosses each tier.
fn scenario_1_commission_tiers() {
    println!("Scenario 1: Commission Tiers\n");

    let schedule = CommissionSchedule::default();
    for volume in [dec!(0), dec!(1_000_001), dec!(6_000_000), dec!(12_000_000)] {
        let rate = commission_rate(volume, &schedule);
        let fee = estimate_commission(Figure::new(dec!(1000)), Figure::new(dec!(100)), volume, &schedule);
        println!(
            "  30d volume {:>14}: rate {}, fee on 1,000 @ 100 = {}",
            format_number(volume, 0),
            rate.normalize(),
            format_figure(fee, 2)
        );
    }
    println!();
}

/// Liquidation distance shrinks as leverage grows.
fn scenario_2_liquidation_prices() {
    println!("Scenario 2: Liquidation Prices\n");

    let params = LiquidationParams::default();
    let entry = Figure::new(dec!(45000));
    for lev in [dec!(1), dec!(5), dec!(10), dec!(50), dec!(100)] {
        let leverage = Leverage::effective(Some(lev));
        let long = calculate_liquidation_price(entry, leverage, Side::Long, &params);
        let short = calculate_liquidation_price(entry, leverage, Side::Short, &params);
        println!(
            "  {:>5} from $45,000: long liq ${}, short liq ${}",
            leverage.to_string(),
            format_figure(long, 2),
            format_figure(short, 2)
        );
    }
    println!();
}

/// Full form recompute with the demo wallet.
fn scenario_3_margin_sizing() {
    println!("Scenario 3: Margin Sizing\n");

    let mut form = OrderFormController::with_config(DeskConfig::default());
    form.set_market_price(dec!(45000));
    form.set_amount("2500");
    form.set_leverage("20");

    let view = form.metrics();
    println!("  Wallet $10,000, amount 2,500 at 20x");
    println!("  Required margin: ${}", format_figure(view.metrics.required_margin, 2));
    println!("  Max position: ${}", format_figure(view.metrics.max_position_amount, 2));
    println!("  Free margin: ${}", format_figure(view.margin.free_margin, 2));
    println!("  Wallet usage: {}%", format_figure(view.margin.wallet_usage_percent, 2));

    form.set_amount("abc");
    println!("  Amount 'abc' -> required margin {}", form.metrics().metrics.required_margin);

    form.set_leverage("500");
    for note in form.drain_notifications() {
        println!("  [{:?}] {}", note.level, note.message);
    }
    println!();
}

/// Checks run in order and the first failure wins.
fn scenario_4_validation() {
    println!("Scenario 4: Order Validation\n");

    let mut form = OrderFormController::with_config(DeskConfig::default())
        .with_sink(Box::new(RecordingSink::default()));
    form.set_market_price(dec!(45000));

    let attempts: [(&str, fn(&mut OrderFormController)); 4] = [
        ("empty amount", |_| {}),
        ("limit without price", |f| {
            f.set_amount("1");
            f.set_order_type(OrderType::Limit);
        }),
        ("stop without trigger", |f| {
            f.set_order_type(OrderType::Stop);
            f.set_order_price("44000");
        }),
        ("complete stop order", |f| f.set_trigger_price("44500")),
    ];

    for (label, step) in attempts {
        step(&mut form);
        match form.place_order() {
            Ok(payload) => println!(
                "  {}: placed {} {} {}",
                label,
                payload.order_type(),
                payload.amount(),
                payload.pair()
            ),
            Err(reason) => println!("  {}: rejected, {}", label, reason),
        }
    }
    println!();
}

fn scenario_5_take_profit_stop_loss() {
    println!("Scenario 5: Take Profit / Stop Loss Placement\n");

    let cases = [
        (Side::Long, "47000", "43000"),
        (Side::Long, "44000", "43000"),
        (Side::Short, "43000", "47000"),
        (Side::Short, "43000", "44000"),
    ];

    for (side, tp, sl) in cases {
        let draft = OrderDraft::new(side, OrderType::Market)
            .with_amount("1")
            .with_leverage("10")
            .with_tp_sl(tp, sl);
        let verdict = match validate_order(&draft, Some(&btc()), Some(dec!(45000)), Timestamp::now()) {
            Ok(_) => "ok".to_string(),
            Err(reason) => reason.to_string(),
        };
        println!("  {} tp {} sl {} vs $45,000: {}", side, tp, sl, verdict);
    }
    println!();
}

/// Poller against a scripted source, including a failed fetch and a pair switch.
fn scenario_6_mock_quote_feed() {
    println!("Scenario 6: Mock Quote Feed\n");

    let source = Arc::new(MockQuoteSource::new("mock"));
    let eth = TradingPair::new("ETH", "USDT");
    source.set_price(&btc(), dec!(45000), dec!(2.1));
    source.set_price(&eth, dec!(3000), dec!(-0.8));

    let rt = runtime();
    rt.block_on(async {
        let poller = QuotePoller::from_shared(Arc::clone(&source), Duration::from_millis(50));
        let mut handle = poller.spawn(btc());
        let mut form = OrderFormController::with_config(DeskConfig::default());
        form.set_amount("1000");
        form.set_leverage("10");

        if let Some(quote) = handle.next_quote().await {
            form.apply_quote(&quote);
            println!("  {} @ ${} ({})", quote.pair, format_number(quote.price, 2), format_percent(quote.change_pct_24h));
        }

        source.set_healthy(false);
        tokio::time::sleep(Duration::from_millis(120)).await;
        println!(
            "  Source down, last price still ${}",
            handle.latest().map(|q| q.price).unwrap_or(Decimal::ZERO)
        );
        source.set_healthy(true);

        form.select_pair(eth.clone());
        handle.select_pair(eth.clone());
        while let Some(quote) = handle.next_quote().await {
            if form.apply_quote(&quote) {
                println!("  Switched to {} @ ${}", quote.pair, format_number(quote.price, 2));
                break;
            }
        }
        println!(
            "  ETH 10x long liquidation: ${}",
            format_figure(form.metrics().metrics.liquidation_price, 2)
        );
        println!("  Source was called {} times", source.call_count());
        handle.shutdown();
    });
    println!();
}

/// Last selected pair survives a restart, and a different key reads nothing back.
fn scenario_7_pair_persistence() {
    println!("Scenario 7: Pair Persistence\n");

    let backing = MemoryStore::default();
    let open = |key: &str| {
        let cipher = PairCipher::from_passphrase(key).unwrap();
        let store = PairStore::new(Box::new(backing.clone()), cipher);
        OrderFormController::with_config(DeskConfig::default()).with_pair_store(store)
    };

    let mut form = open("desk-key");
    form.select_pair(TradingPair::new("SOL", "USDT"));
    let sealed = backing.raw(PAIR_KEY).unwrap_or_default();
    println!("  Stored under '{}': {}...", PAIR_KEY, &sealed[..sealed.len().min(24)]);

    let restarted = open("desk-key");
    println!("  After restart: {}", restarted.selected_pair().map(|p| p.to_string()).unwrap_or_default());

    let rekeyed = open("other-key");
    println!("  With another key: {}", rekeyed.selected_pair().map(|p| p.to_string()).unwrap_or_default());
    println!();
}

fn scenario_8_live_quotes() {
    println!("Scenario 8: Live Quotes\n");

    let config = DeskConfig::default().with_env_overrides().unwrap();
    let client = CryptoCompareClient::new(&config.quote_feed).unwrap();
    println!("  Polling {} every {}s", client.base_url(), config.quote_feed.poll_interval_secs);

    let rt = runtime();
    rt.block_on(async {
        let mut form = OrderFormController::with_config(config.clone());
        if let Some(store) = PairStore::from_config(&config.storage) {
            form = form.with_pair_store(store);
        }
        let pair = form.selected_pair().cloned().unwrap_or_else(btc);
        let mut handle = QuotePoller::new(client, config.quote_feed.poll_interval()).spawn(pair);
        form.set_amount("1000");
        form.set_leverage("10");

        for _ in 0..3 {
            let wait = config.quote_feed.poll_interval() + config.quote_feed.request_timeout();
            match tokio::time::timeout(wait, handle.next_quote()).await {
                Ok(Some(quote)) => {
                    form.apply_quote(&quote);
                    println!(
                        "  {} @ ${}  24h {}  cap {}",
                        quote.pair,
                        format_number(quote.price, 2),
                        format_percent(quote.change_pct_24h),
                        quote.market_cap.map(format_compact).unwrap_or_else(|| "-".to_string())
                    );
                    println!(
                        "    long 10x liq ${}, commission ${}",
                        format_figure(form.metrics().metrics.liquidation_price, 2),
                        format_figure(form.metrics().metrics.commission, 2)
                    );
                }
                Ok(None) => break,
                Err(_) => println!("  No quote within {}s", wait.as_secs()),
            }
        }
        handle.shutdown();
    });
}
