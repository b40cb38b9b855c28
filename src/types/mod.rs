//! Core types shared across the crate.
//!
//! This module contains the scalar aliases used throughout the book engine and
//! the canonical records that cross the venue-codec boundary:
//!
//! - [`events`] - Canonical delta/snapshot/health records
//! - [`order`] - Normalized order placement and position types

pub mod events;
pub mod order;

pub use events::{
    AlertKind, DeltaEvent, FeedEvent, HealthAlert, LevelChange, PriceLevel, SequenceRange,
    SnapshotEvent,
};
pub use order::{OrderAck, OrderGateway, OrderRequest, OrderSide, OrderStatus, OrderType, Position};

/// Price of one level, in venue-native units
///
/// Venues quote in arbitrary decimal grids, so prices stay `f64` end to end.
/// A NaN price is a programming error upstream of this crate and is
/// debug-asserted at the book boundary, never handled at runtime. Ordering
/// inside the book uses `f64::total_cmp`.
pub type Price = f64;

/// Resting quantity at one level, in venue-native units
///
/// A quantity of zero (or below) in a change record means "remove the level".
pub type Qty = f64;

/// Identifier of one price level
///
/// Usually the level is keyed by its price and no separate id exists; some
/// venues instead key levels by an independent order identifier, in which case
/// changes carry this id and the book maintains an id index.
pub type LevelId = u64;

/// Timestamp in milliseconds since Unix epoch
pub type TimestampMs = u64;

/// Current wall-clock time in milliseconds since Unix epoch
pub fn now_ms() -> TimestampMs {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as TimestampMs)
        .unwrap_or(0)
}
