// 14.0: display formatting. en-US digit grouping for prices and balances, compact
// K/M/B/T for banner figures like market cap and volume. invalid figures print NaN.

use crate::types::Figure;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// `1234567.891` with 2 decimals -> `1,234,567.89`.
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text.clone(), String::new()),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if decimals > 0 {
        let mut frac = frac_part;
        while frac.len() < decimals as usize {
            frac.push('0');
        }
        out.push('.');
        out.push_str(&frac);
    }
    out
}

pub fn format_figure(figure: Figure, decimals: u32) -> String {
    match figure.value() {
        Some(v) => format_number(v, decimals),
        None => "NaN".to_string(),
    }
}

/// `880_000_000_000` -> `880.00B`. Values under a thousand keep two decimals.
pub fn format_compact(value: Decimal) -> String {
    const UNITS: [(Decimal, &str); 4] = [
        (dec!(1_000_000_000_000), "T"),
        (dec!(1_000_000_000), "B"),
        (dec!(1_000_000), "M"),
        (dec!(1_000), "K"),
    ];

    // pick the unit after rounding so 999_999.999 reads 1.00M, not 1,000.00K
    for (threshold, suffix) in UNITS {
        let scaled = (value / threshold).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if scaled.abs() >= Decimal::ONE {
            return format!("{}{}", format_number(scaled, 2), suffix);
        }
    }
    format_number(value, 2)
}

pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_number(value, 2))
}
