//! # bookwire
//!
//! Multi-venue market connectivity with synchronized local orderbooks.
//!
//! For each configured venue, bookwire keeps an in-process replica of every
//! subscribed symbol's limit order book consistent with the venue's
//! authoritative book, fed by the venue's delta stream plus on-demand
//! snapshots, and exposes one read surface regardless of venue.
//!
//! ## What it handles
//!
//! - **Bootstrap** - both snapshot schemes found in the wild: venues that push
//!   a full snapshot as the first stream frame, and venues whose stream
//!   carries only update-id-tagged deltas with snapshots fetched over REST
//!   and reconciled against the stream
//! - **Gaps** - a sequence gap silently restarts bootstrap; convergence is
//!   guaranteed within a resynchronization window, individual missed deltas
//!   are not replayed
//! - **Silent failure** - a frozen feed (connected but not updating), a
//!   crossed book (best ask at or below best bid), and stale deltas are
//!   detected by independent monitors and escalate to a connection rebuild
//! - **Isolation** - every replica is owned by exactly one (venue, symbol)
//!   pair; sessions own all per-venue mutable state with an explicit
//!   open/close lifecycle
//!
//! ## What it does not do
//!
//! No matching, no venue simulation, no persistence. Venue wire formats stay
//! behind the [`client::FeedCodec`] / [`client::SnapshotCodec`] seams, and
//! order signing/routing behind [`types::OrderGateway`] — all implemented per
//! venue outside this crate.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bookwire::config::{SyncMode, VenueConfig};
//! use bookwire::session::VenueSession;
//! # use bookwire::client::FeedCodec;
//! # use bookwire::types::FeedEvent;
//! # struct MyCodec;
//! # impl FeedCodec for MyCodec {
//! #     fn subscribe_frames(&self, _: &[String]) -> Vec<String> { vec![] }
//! #     fn decode(&self, _: &str) -> Result<Option<FeedEvent>, bookwire::Error> { Ok(None) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bookwire::Error> {
//!     let config = VenueConfig::new("kraken", "wss://ws.kraken.com/v2", SyncMode::PushSnapshot)?
//!         .with_symbols(["BTC/USD", "ETH/USD"]);
//!
//!     let mut session = VenueSession::new(config);
//!     let mut alerts = session.alerts().expect("taken once");
//!     session.open(MyCodec, None)?;
//!
//!     loop {
//!         tokio::select! {
//!             Some(alert) = alerts.recv() => {
//!                 // Connection-fatal; the session is already rebuilding itself.
//!                 eprintln!("health violation: {alert:?}");
//!             }
//!             _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {
//!                 if session.is_synced("BTC/USD") {
//!                     println!("{:?}", session.top_of_book("BTC/USD"));
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`book`] - ladders, replicas, sync strategies, health checks, and the
//!   per-venue [`book::BookManager`]
//! - [`client`] - WebSocket feed driver, REST snapshot fetching, rate limiter
//! - [`session`] - per-venue session owning all connection-scoped state
//! - [`config`] - per-venue configuration
//! - [`types`] - canonical records and the normalized order boundary
//! - [`error`] - error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod book;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

// Re-export main types at crate root for convenience
pub use book::{BookManager, Depth, Quote, SyncState, TopOfBook};
pub use client::{FeedCodec, RateLimiter, ReconnectConfig, RestClient, SnapshotCodec, SnapshotFetcher};
pub use config::{RateLimit, SyncMode, VenueConfig};
pub use error::Error;
pub use session::VenueSession;
pub use types::{AlertKind, DeltaEvent, FeedEvent, HealthAlert, SnapshotEvent};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
