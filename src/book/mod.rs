//! Synchronized local orderbook replicas.
//!
//! This module is the core of the crate: sorted price ladders, the per-symbol
//! replica with its sync state machine, the push/pull bootstrap strategies,
//! the health checks, and the per-venue [`BookManager`] registry.
//!
//! # Example
//!
//! ```rust
//! use bookwire::book::BookManager;
//! use bookwire::config::SyncMode;
//! use bookwire::types::{PriceLevel, SnapshotEvent};
//!
//! let manager = BookManager::new(SyncMode::PushSnapshot);
//! manager.track("BTC-USDT");
//!
//! manager.process_snapshot(SnapshotEvent {
//!     symbol: "BTC-USDT".to_string(),
//!     seq: None,
//!     asks: vec![PriceLevel::new(42_001.0, 0.5)],
//!     bids: vec![PriceLevel::new(42_000.0, 1.2)],
//! });
//!
//! let top = manager.top_of_book("BTC-USDT").unwrap();
//! assert_eq!(top.ask.unwrap().price, 42_001.0);
//! ```

pub mod health;
pub mod ladder;
pub mod manager;
pub mod replica;
pub mod sync;

pub use ladder::{Ladder, Side};
pub use manager::BookManager;
pub use replica::{BookReplica, Depth, Quote, SyncState, TopOfBook};
pub use sync::{strategy_for, PullSync, PushSync, SyncAction, SyncStrategy};
