//! CoinGecko integration for Pulse
//!
//! This crate provides a client for the public CoinGecko market API,
//! which serves coin prices without requiring authentication.

pub mod client;
pub mod types;

pub use client::{CoinGeckoClient, FETCH_ERROR};
pub use types::{MarketsQuery, COINGECKO_API_BASE, PER_PAGE, VS_CURRENCY};
