//! HTTP client for the public CryptoCompare quote API.
//!
//! Only the `pricemultifull` endpoint is used. Its payload nests quotes as
//! `RAW[base][quote]`. Wire types stay private and are converted into
//! `MarketQuote` at the boundary.

use crate::price_feed::{FeedError, MarketQuote, QuoteFeedConfig, QuoteSource};
use crate::types::TradingPair;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct PriceMultiFull {
    #[serde(rename = "RAW", default)]
    raw: HashMap<String, HashMap<String, RawQuote>>,
    // error envelope: {"Response": "Error", "Message": "..."}
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "PRICE")]
    price: Decimal,
    #[serde(rename = "CHANGEPCT24HOUR", default)]
    change_pct_24h: Decimal,
    #[serde(rename = "HIGH24HOUR", default)]
    high_24h: Option<Decimal>,
    #[serde(rename = "LOW24HOUR", default)]
    low_24h: Option<Decimal>,
    #[serde(rename = "VOLUME24HOUR", default)]
    volume_24h: Option<Decimal>,
    #[serde(rename = "MKTCAP", default)]
    market_cap: Option<Decimal>,
    #[serde(rename = "SUPPLY", default)]
    supply: Option<Decimal>,
    #[serde(rename = "MARKET", default)]
    market: Option<String>,
}

/// Pulls the quote for `pair` out of a `pricemultifull` response body.
pub fn parse_price_multi_full(body: &str, pair: &TradingPair) -> Result<MarketQuote, FeedError> {
    let mut parsed: PriceMultiFull = serde_json::from_str(body)?;

    if parsed.raw.is_empty() && parsed.response.as_deref() == Some("Error") {
        return Err(FeedError::Api(
            parsed.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let raw = parsed
        .raw
        .get_mut(&pair.base)
        .and_then(|by_quote| by_quote.remove(&pair.quote))
        .ok_or_else(|| FeedError::MissingPair(pair.clone()))?;

    if raw.price <= Decimal::ZERO {
        return Err(FeedError::InvalidPrice {
            pair: pair.clone(),
            price: raw.price,
        });
    }

    Ok(MarketQuote {
        pair: pair.clone(),
        price: raw.price,
        change_pct_24h: raw.change_pct_24h,
        high_24h: raw.high_24h,
        low_24h: raw.low_24h,
        volume_24h: raw.volume_24h,
        market_cap: raw.market_cap,
        supply: raw.supply,
        market: raw.market,
    })
}

pub struct CryptoCompareClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl CryptoCompareClient {
    pub fn new(config: &QuoteFeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl QuoteSource for CryptoCompareClient {
    fn name(&self) -> &str {
        "cryptocompare"
    }

    async fn fetch_quote(&self, pair: &TradingPair) -> Result<MarketQuote, FeedError> {
        let url = format!("{}/pricemultifull", self.base_url);
        let mut query = vec![("fsyms", pair.base.as_str()), ("tsyms", pair.quote.as_str())];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("api_key", key));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_price_multi_full(&body, pair)
    }
}
