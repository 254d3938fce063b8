//! Market price snapshot returned by the coin market API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the market table
///
/// Numeric fields are optional because the upstream API reports `null`
/// for coins without recent trading data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Coin identifier (e.g., "bitcoin")
    pub id: String,

    /// Ticker symbol (e.g., "btc")
    pub symbol: String,

    /// Human-readable name
    pub name: String,

    /// URL to the coin icon
    pub image: String,

    /// Last traded price in the quote currency
    #[serde(default)]
    pub current_price: Option<Decimal>,

    /// Change over the last 24 hours, in percent (e.g., 5.2 for +5.2%)
    #[serde(default)]
    pub price_change_percentage_24h: Option<Decimal>,

    /// 24h traded volume in the quote currency
    #[serde(default)]
    pub total_volume: Option<Decimal>,

    /// Market capitalisation in the quote currency
    #[serde(default)]
    pub market_cap: Option<Decimal>,
}
