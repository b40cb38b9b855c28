//! Canonical feed and health event records.
//!
//! Venue codecs translate wire frames into these records; everything past the
//! codec boundary (sync strategies, replicas, monitors) speaks only this
//! vocabulary. The shapes are deliberately venue-neutral: a price-keyed venue
//! leaves `id` unset, an id-keyed venue fills it in, and only venues with
//! pull-style bootstrap carry a [`SequenceRange`].

use serde::{Deserialize, Serialize};

use super::{LevelId, Price, Qty, TimestampMs};

/// One price level, as carried in snapshots and depth reads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level identifier, when the venue keys levels by order id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LevelId>,
    /// Level price
    pub price: Price,
    /// Resting quantity
    pub qty: Qty,
}

impl PriceLevel {
    /// Price-keyed level (the common case)
    pub fn new(price: Price, qty: Qty) -> Self {
        Self {
            id: None,
            price,
            qty,
        }
    }

    /// Id-keyed level
    pub fn with_id(id: LevelId, price: Price, qty: Qty) -> Self {
        Self {
            id: Some(id),
            price,
            qty,
        }
    }
}

/// First and last update-id covered by one delta message
///
/// Used during pull-snapshot bootstrap to decide whether a fetched snapshot
/// falls inside, before, or after the span of a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRange {
    /// First update id in the message (`U`)
    pub first: u64,
    /// Last update id in the message (`u`)
    pub last: u64,
}

/// A single level mutation inside a delta event
///
/// `qty <= 0` means the level is gone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelChange {
    /// Level identifier for id-keyed venues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LevelId>,
    /// Level price
    pub price: Price,
    /// New resting quantity (zero removes)
    pub qty: Qty,
}

impl LevelChange {
    /// Price-keyed change
    pub fn new(price: Price, qty: Qty) -> Self {
        Self {
            id: None,
            price,
            qty,
        }
    }

    /// Id-keyed change
    pub fn with_id(id: LevelId, price: Price, qty: Qty) -> Self {
        Self {
            id: Some(id),
            price,
            qty,
        }
    }
}

/// Incremental book update for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaEvent {
    /// Symbol the update applies to
    pub symbol: String,
    /// Venue-side origin timestamp of this message
    pub origin_ts_ms: TimestampMs,
    /// Update-id span, present only on pull-snapshot venues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<SequenceRange>,
    /// Ask-side changes, in message order
    pub asks: Vec<LevelChange>,
    /// Bid-side changes, in message order
    pub bids: Vec<LevelChange>,
}

/// Full point-in-time book state for one symbol
///
/// Delivered inline on push-snapshot venues, or as the response to an explicit
/// fetch on pull-snapshot venues (where `seq` carries the snapshot's last
/// update id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEvent {
    /// Symbol the snapshot describes
    pub symbol: String,
    /// Last update id baked into the snapshot, on pull-snapshot venues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    /// All ask levels, best (lowest price) first
    pub asks: Vec<PriceLevel>,
    /// All bid levels, best (highest price) first
    pub bids: Vec<PriceLevel>,
}

/// A decoded inbound feed frame
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Incremental update
    Delta(DeltaEvent),
    /// Full book state
    Snapshot(SnapshotEvent),
}

/// Kind of health violation detected on a replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// Delta older than the freshness window
    StaleFeed,
    /// Top-of-book unchanged across a full monitor interval
    FrozenBook,
    /// Best ask at or below best bid across two checks
    CrossedBook,
}

/// Health violation raised to the owning connection
///
/// All three kinds are connection-fatal: the expected reaction is a forced
/// reconnect, which discards and rebuilds every replica on the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    /// Symbol whose replica violated an invariant
    pub symbol: String,
    /// Violation kind
    pub kind: AlertKind,
    /// Human-readable context for logs and dashboards
    pub detail: String,
}
