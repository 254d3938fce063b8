//! Core types for Pulse
//!
//! This crate defines the shared data structures used across the workspace:
//! market prices, message requests, query keys, the remote source traits
//! and the locale formatting used by the renderers.

pub mod error;
pub mod format;
pub mod message;
pub mod price;
pub mod query;
pub mod source;

pub use error::{PulseError, PulseResult};
pub use format::Trend;
pub use message::{Message, MessageStatus, NewMessage};
pub use price::Price;
pub use query::{QueryKey, QueryStatus};
pub use source::{MarketSource, MessageSource};
