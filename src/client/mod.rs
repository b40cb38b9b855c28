//! Venue-facing plumbing.
//!
//! This module contains:
//!
//! - [`transport`] - WebSocket feed driver with reconnect/backoff
//! - [`rest`] - REST snapshot fetching behind the [`rest::SnapshotFetcher`] seam
//! - [`limiter`] - Token-bucket rate limiter for request/response calls

pub mod limiter;
pub mod rest;
pub mod transport;

pub use limiter::RateLimiter;
pub use rest::{RestClient, SnapshotCodec, SnapshotFetcher};
pub use transport::{FeedCodec, FeedConnection, ReconnectConfig};
