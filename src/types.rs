// 1.0: primitives used by every calculator. sides, order kinds, pairs, leverage, timestamps,
// and Figure, the decimal that can go invalid when a form field does not parse.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
    Stop,
}

impl OrderType {
    /// Limit and stop orders carry their own order price.
    pub fn has_order_price(&self) -> bool {
        !matches!(self, OrderType::Market)
    }

    pub fn has_trigger_price(&self) -> bool {
        matches!(self, OrderType::Stop)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
            OrderType::Stop => write!(f, "stop"),
        }
    }
}

// isolated = margin ring-fenced per position. multiplied = shared account margin (a.k.a. cross).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginType {
    #[default]
    Isolated,
    #[serde(alias = "cross")]
    Multiplied,
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginType::Isolated => write!(f, "isolated"),
            MarginType::Multiplied => write!(f, "multiplied"),
        }
    }
}

// 1.1: base/quote pair, e.g. BTC-USDT. symbols are stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
        }
    }

    pub fn has_base(&self) -> bool {
        !self.base.is_empty()
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trading pair {0:?}, expected BASE-QUOTE")]
pub struct PairParseError(pub String);

impl FromStr for TradingPair {
    type Err = PairParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once(|c: char| c == '-' || c == '/')
            .ok_or_else(|| PairParseError(s.to_string()))?;
        if base.trim().is_empty() || quote.trim().is_empty() {
            return Err(PairParseError(s.to_string()));
        }
        Ok(Self::new(base, quote))
    }
}

/// Pairs offered by the pair selector, first one selected on startup.
pub fn default_pairs() -> Vec<TradingPair> {
    vec![
        TradingPair::new("BTC", "USDT"),
        TradingPair::new("ETH", "USDT"),
        TradingPair::new("SOL", "USDT"),
    ]
}

/// Parses a form field. Empty or non-numeric input yields None.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

// 1.2: a derived number that is either a decimal or invalid. invalid behaves like NaN:
// any arithmetic touching it stays invalid, and it renders as "NaN".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Figure(Option<Decimal>);

impl Figure {
    pub fn new(value: Decimal) -> Self {
        Self(Some(value))
    }

    pub fn invalid() -> Self {
        Self(None)
    }

    pub fn from_input(input: &str) -> Self {
        Self(parse_decimal(input))
    }

    pub fn zero() -> Self {
        Self(Some(Decimal::ZERO))
    }

    pub fn value(&self) -> Option<Decimal> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn and_then(self, f: impl FnOnce(Decimal) -> Option<Decimal>) -> Self {
        Self(self.0.and_then(f))
    }
}

impl From<Decimal> for Figure {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl From<Option<Decimal>> for Figure {
    fn from(value: Option<Decimal>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v.normalize()),
            None => write!(f, "NaN"),
        }
    }
}

// checked ops: overflow and division by zero make the figure invalid instead of panicking
impl Add for Figure {
    type Output = Figure;
    fn add(self, rhs: Figure) -> Figure {
        Figure(self.0.zip(rhs.0).and_then(|(a, b)| a.checked_add(b)))
    }
}

impl Sub for Figure {
    type Output = Figure;
    fn sub(self, rhs: Figure) -> Figure {
        Figure(self.0.zip(rhs.0).and_then(|(a, b)| a.checked_sub(b)))
    }
}

impl Mul for Figure {
    type Output = Figure;
    fn mul(self, rhs: Figure) -> Figure {
        Figure(self.0.zip(rhs.0).and_then(|(a, b)| a.checked_mul(b)))
    }
}

impl Div for Figure {
    type Output = Figure;
    fn div(self, rhs: Figure) -> Figure {
        Figure(self.0.zip(rhs.0).and_then(|(a, b)| a.checked_div(b)))
    }
}

impl Mul<Decimal> for Figure {
    type Output = Figure;
    fn mul(self, rhs: Decimal) -> Figure {
        self.and_then(|a| a.checked_mul(rhs))
    }
}

impl Div<Decimal> for Figure {
    type Output = Figure;
    fn div(self, rhs: Decimal) -> Figure {
        self.and_then(|a| a.checked_div(rhs))
    }
}

// 1.3: leverage multiplier. always >= 1x. form input below 1x, zero, or garbage floors to 1x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Leverage(Decimal);

impl TryFrom<Decimal> for Leverage {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("leverage {value} is below 1x"))
    }
}

impl Leverage {
    pub const ONE: Leverage = Leverage(Decimal::ONE);

    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ONE {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Leverage used by the calculators for whatever the user typed.
    pub fn effective(input: Option<Decimal>) -> Self {
        input.and_then(Self::new).unwrap_or(Self::ONE)
    }

    pub fn from_input(input: &str) -> Self {
        Self::effective(parse_decimal(input))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    // 10x leverage -> 0.1 of notional posted as margin
    pub fn inverse(&self) -> Decimal {
        Decimal::ONE / self.0
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0.normalize())
    }
}

// 1.4: millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}
