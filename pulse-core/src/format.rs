//! Display formatting for the `id-ID` locale
//!
//! Numbers group thousands with `.` and use `,` as the decimal separator.
//! Dates render as `d/m/yyyy, HH.MM.SS`.

use chrono::{DateTime, Local, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Maximum fraction digits for plain numbers
const NUMBER_MAX_FRACTION: u32 = 3;

/// Fraction digits for percentages (fixed)
const PERCENT_FRACTION: u32 = 1;

/// Direction of a price change, used to pick the display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Positive change (green)
    Up,
    /// Negative change (red)
    Down,
    /// No change (neutral)
    Flat,
}

impl Trend {
    pub fn of(change: Decimal) -> Self {
        if change > Decimal::ZERO {
            Trend::Up
        } else if change < Decimal::ZERO {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Format a number with up to three fraction digits, e.g. `1.234.567,891`
pub fn format_number(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(NUMBER_MAX_FRACTION, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    group_digits(rounded, 0)
}

/// Format a percentage value (5.2 means 5.2%) as `5,2%`
pub fn format_percent(percent: Decimal) -> String {
    let rounded =
        percent.round_dp_with_strategy(PERCENT_FRACTION, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", group_digits(rounded, PERCENT_FRACTION as usize))
}

/// Format a timestamp in the given timezone
pub fn format_timestamp<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format("%-d/%-m/%Y, %H.%M.%S").to_string()
}

/// Format a timestamp in the viewer's local timezone
pub fn format_local_timestamp(at: &DateTime<Utc>) -> String {
    format_timestamp(at, &Local)
}

fn group_digits(value: Decimal, min_fraction: usize) -> String {
    let negative = value.is_sign_negative() && !value.is_zero();
    let text = value.abs().to_string();
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut out = String::with_capacity(text.len() + integer.len() / 3 + 2);
    if negative {
        out.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(digit);
    }

    let mut fraction = fraction.to_string();
    while fraction.len() < min_fraction {
        fraction.push('0');
    }
    if !fraction.is_empty() {
        out.push(',');
        out.push_str(&fraction);
    }

    out
}
