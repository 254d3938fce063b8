//! Plain-text rendering of cached query state

use colored::{Color, Colorize};
use pulse_core::format::{format_local_timestamp, format_number, format_percent};
use pulse_core::{Message, MessageStatus, Price, Trend};
use pulse_services::{FieldErrors, MessageForm, QueryState};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Shown instead of rows when the market page failed to load
pub const MARKET_ERROR: &str = "Error Fetching Data";

const MISSING: &str = "-";

/// Colour of the 24h change column; `None` keeps the terminal default
pub fn change_color(change: Decimal) -> Option<Color> {
    match Trend::of(change) {
        Trend::Up => Some(Color::Green),
        Trend::Down => Some(Color::Red),
        Trend::Flat => None,
    }
}

/// Colour of a status badge
pub fn status_color(status: MessageStatus) -> Color {
    match status {
        MessageStatus::Pending => Color::Yellow,
        MessageStatus::Failed => Color::Red,
        MessageStatus::Success => Color::Green,
    }
}

fn number(value: Option<Decimal>) -> String {
    value.map(format_number).unwrap_or_else(|| MISSING.to_string())
}

fn change_cell(change: Option<Decimal>, width: usize) -> String {
    let Some(change) = change else {
        return format!("{:>width$}", MISSING);
    };
    let text = format!("{:>width$}", format_percent(change));
    match change_color(change) {
        Some(color) => text.color(color).to_string(),
        None => text,
    }
}

/// Render one market page
pub fn render_market(state: &QueryState<Vec<Price>>, page: u32) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:<24} {:>20} {:>8} {:>24} {:>26}",
            "Coin", "Price", "24h", "Volume", "Market Cap"
        )
        .bold()
    );

    match (&state.data, state.is_error()) {
        (_, true) => {
            let _ = writeln!(out, "{}", MARKET_ERROR.red());
        }
        (None, false) => {
            let _ = writeln!(out, "Loading...");
        }
        (Some(prices), false) => {
            for price in prices {
                let coin = format!("{} ({})", price.name, price.symbol.to_uppercase());
                let _ = writeln!(
                    out,
                    "{:<24} {:>20} {} {:>24} {:>26}",
                    coin,
                    number(price.current_price),
                    change_cell(price.price_change_percentage_24h, 8),
                    number(price.total_volume),
                    number(price.market_cap),
                );
            }
        }
    }

    let _ = write!(out, "Page {}", page);
    if state.is_fetching {
        let _ = write!(out, "  {}", "fetching...".dimmed());
    }
    out.push('\n');
    out
}

/// Render a status badge
pub fn status_badge(status: MessageStatus) -> String {
    format!("{:<8}", status.label())
        .color(status_color(status))
        .to_string()
}

/// Render the message status table
pub fn render_messages(messages: &[Message]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        format!("{:<22} {:<16} {:<8} {}", "Date", "Phone Number", "Status", "Message").bold()
    );

    if messages.is_empty() {
        let _ = writeln!(out, "{}", "No messages yet".dimmed());
    }

    for message in messages {
        let date = message
            .created_at
            .as_ref()
            .map(format_local_timestamp)
            .unwrap_or_else(|| MISSING.to_string());
        let _ = writeln!(
            out,
            "{:<22} {:<16} {} {}",
            date,
            message.phone_number,
            status_badge(message.status),
            message.message
        );
    }
    out
}

fn field_error_lines(errors: &FieldErrors) -> impl Iterator<Item = &'static str> {
    [errors.phone_number, errors.message].into_iter().flatten()
}

/// Render validation and submission errors of the request form
pub fn render_form(form: &MessageForm) -> String {
    let mut out = String::new();
    for error in field_error_lines(form.field_errors()) {
        let _ = writeln!(out, "{}", error.red());
    }
    if let Some(error) = form.error() {
        let _ = writeln!(out, "{}", error.red());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pulse_core::{NewMessage, QueryStatus};
    use rust_decimal_macros::dec;

    fn plain() {
        colored::control::set_override(false);
    }

    fn bitcoin() -> Price {
        Price {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: String::new(),
            current_price: Some(dec!(1050000000.5)),
            price_change_percentage_24h: Some(dec!(5.24)),
            total_volume: None,
            market_cap: Some(dec!(20000000000000)),
        }
    }

    fn loaded(prices: Vec<Price>) -> QueryState<Vec<Price>> {
        QueryState {
            data: Some(prices),
            status: QueryStatus::Success,
            ..Default::default()
        }
    }

    #[test]
    fn test_change_colors() {
        assert_eq!(change_color(dec!(-5)), Some(Color::Red));
        assert_eq!(change_color(dec!(0)), None);
        assert_eq!(change_color(dec!(7)), Some(Color::Green));
    }

    #[test]
    fn test_status_badges() {
        plain();
        let cases = [
            (MessageStatus::from_wire(None), "waiting"),
            (MessageStatus::from_wire(Some("failed")), "failed"),
            (MessageStatus::from_wire(Some("success")), "success"),
            (MessageStatus::from_wire(Some("unknown-string")), "waiting"),
        ];
        for (status, label) in cases {
            assert_eq!(status_badge(status).trim_end(), label);
        }
        assert_eq!(status_color(MessageStatus::Pending), Color::Yellow);
        assert_eq!(status_color(MessageStatus::Failed), Color::Red);
        assert_eq!(status_color(MessageStatus::Success), Color::Green);
    }

    #[test]
    fn test_market_rows() {
        plain();
        let out = render_market(&loaded(vec![bitcoin()]), 1);

        assert!(out.contains("Bitcoin (BTC)"));
        assert!(out.contains("1.050.000.000,5"));
        assert!(out.contains("5,2%"));
        assert!(out.contains("20.000.000.000.000"));
        assert!(out.trim_end().ends_with("Page 1"));
    }

    #[test]
    fn test_market_error_replaces_rows() {
        plain();
        let state = QueryState {
            status: QueryStatus::Error,
            error: Some("Fetching Error".to_string()),
            ..loaded(vec![bitcoin()])
        };

        let out = render_market(&state, 2);
        assert!(out.contains(MARKET_ERROR));
        assert!(!out.contains("Bitcoin"));
        assert!(out.contains("Page 2"));
    }

    #[test]
    fn test_market_fetching_indicator() {
        plain();
        let state = QueryState {
            is_fetching: true,
            ..loaded(vec![])
        };
        assert!(render_market(&state, 3).contains("fetching..."));
        assert!(render_market(&QueryState::default(), 1).contains("Loading..."));
    }

    #[test]
    fn test_message_rows() {
        plain();
        let at = Utc.with_ymd_and_hms(2024, 3, 8, 7, 5, 9).unwrap();
        let pending = Message::pending(NewMessage::new("0812345", "pulsa 10k"), at);

        let out = render_messages(&[pending]);
        assert!(out.contains("0812345"));
        assert!(out.contains("waiting"));
        assert!(out.contains("pulsa 10k"));
        assert!(out.contains("/2024, "));

        assert!(render_messages(&[]).contains("No messages yet"));
    }

    #[test]
    fn test_form_errors() {
        plain();
        let mut form = MessageForm::new();
        form.validate();
        let out = render_form(&form);
        assert!(out.contains("Phone Number Required"));
        assert!(out.contains("message required"));
    }
}
