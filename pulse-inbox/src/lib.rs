//! Message API integration for Pulse
//!
//! Client for the local message request endpoint served by `pulse-api`.

pub mod client;

pub use client::{InboxClient, LIST_ERROR, MESSAGE_API_BASE, SUBMIT_ERROR};
