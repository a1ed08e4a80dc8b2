// order-desk: order-entry risk core for a perpetuals trading form.
// pure synchronous calculators and validation. the only I/O is the quote poller
// and the optional pair store.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Side, OrderType, TradingPair, Figure, Leverage
//   2.x  order.rs: order draft, validated payload, submission sink
//   2.1  validator.rs: ordered pre-submission checks
//   3.x  metrics.rs: recompute pipeline from draft to displayed figures
//   4.x  commission.rs: volume tiered commission rate + fee estimate
//   5.x  margin.rs: required margin, max position, free margin, leverage cap
//   6.x  liquidation.rs: leverage adjusted maintenance, liquidation price
//   7.x  config.rs: commission, margin, account, quote feed, env presets
//   9.x  price_feed.rs: quote source trait, mock source, interval poller
//   9.1  quote_client.rs: cryptocompare http client
//   10.x account.rs: account figures behind a trait
//   11.x notifications.rs: success / warning / error queue
//   14.x format.rs: en-US number + compact formatting
//   15.x form.rs: order form controller
//   16.x pair_store.rs: encrypted last selected pair

// calculators
pub mod commission;
pub mod liquidation;
pub mod margin;
pub mod metrics;
pub mod types;

// order entry
pub mod account;
pub mod form;
pub mod notifications;
pub mod order;
pub mod validator;

// integration modules
pub mod config;
pub mod format;
pub mod pair_store;
pub mod price_feed;
pub mod quote_client;

// re exports for convenience
pub use account::*;
pub use commission::*;
pub use form::OrderFormController;
pub use liquidation::*;
pub use margin::*;
pub use metrics::*;
pub use notifications::*;
pub use order::*;
pub use types::*;
pub use validator::*;
pub use config::{ConfigError, DeskConfig, Environment};
pub use format::{format_compact, format_figure, format_number, format_percent};
pub use pair_store::{FileStore, KeyValueStore, MemoryStore, PairCipher, PairStore, StorageConfig, StoreError, PAIR_KEY};
pub use price_feed::{FeedError, MarketQuote, MockQuoteSource, PollerHandle, QuoteFeedConfig, QuotePoller, QuoteSource};
pub use quote_client::{parse_price_multi_full, CryptoCompareClient};
