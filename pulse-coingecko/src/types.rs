//! CoinGecko API constants and request parameters

use serde::Serialize;

/// Base URL for the CoinGecko public API
pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Quote currency for every price in the table
pub const VS_CURRENCY: &str = "idr";

/// Rows per market page
pub const PER_PAGE: u32 = 10;

/// Query string of `GET /coins/markets`
///
/// Field order is the order on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct MarketsQuery {
    pub vs_currency: &'static str,
    pub per_page: u32,
    pub page: u32,
}

impl MarketsQuery {
    /// Parameters for one page of the market table
    pub fn page(page: u32) -> Self {
        Self {
            vs_currency: VS_CURRENCY,
            per_page: PER_PAGE,
            page,
        }
    }
}
