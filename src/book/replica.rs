//! Local replica of one venue book.
//!
//! A [`BookReplica`] owns the two ladders for a symbol plus everything the
//! sync strategies and health monitors need to keep it honest: the sync state
//! machine, the staged snapshot during pull bootstrap, and the monitors'
//! bookkeeping fields. One replica is exclusively owned by one
//! (venue, symbol) pair; it is never shared across symbols or venues.

use crate::types::{DeltaEvent, Price, PriceLevel, Qty, SnapshotEvent};

use super::ladder::{Ladder, Side};

/// Synchronization state of a replica
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No usable state; deltas are not applied
    Unsynced,
    /// A snapshot fetch is outstanding or staged for reconciliation
    SnapshotPending,
    /// Replica mirrors the venue book; deltas apply directly
    Synced,
}

/// One price/quantity quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Level price
    pub price: Price,
    /// Resting quantity
    pub qty: Qty,
}

/// Best level of each side
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TopOfBook {
    /// Best (lowest) ask, if any
    pub ask: Option<Quote>,
    /// Best (highest) bid, if any
    pub bid: Option<Quote>,
}

/// First N levels of each side, best first
#[derive(Debug, Clone, PartialEq)]
pub struct Depth {
    /// Ask levels, lowest price first
    pub asks: Vec<PriceLevel>,
    /// Bid levels, highest price first
    pub bids: Vec<PriceLevel>,
}

/// Local book replica for a single symbol.
///
/// Mutated only through the sync strategies (in stream order, single writer);
/// the health monitors read it concurrently and touch only their own
/// bookkeeping fields, never the ladders.
#[derive(Debug)]
pub struct BookReplica {
    symbol: String,
    asks: Ladder,
    bids: Ladder,

    state: SyncState,
    /// Set when the staleness check trips; clears on reset
    halted: bool,
    /// Snapshot staged by pull bootstrap, waiting for a covering delta
    pub(crate) pending_snapshot: Option<SnapshotEvent>,

    // Crossed-book detector bookkeeping (see book::health)
    pub(crate) overlap_strikes: u32,
    pub(crate) last_overlap_ask: Option<Price>,
    pub(crate) last_overlap_bid: Option<Price>,

    // Frozen-feed detector bookkeeping
    pub(crate) last_ask_fingerprint: Option<u64>,
    pub(crate) last_bid_fingerprint: Option<u64>,
    pub(crate) freeze_reported: bool,
}

impl BookReplica {
    /// Create an empty, unsynced replica
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            asks: Ladder::new(Side::Ask),
            bids: Ladder::new(Side::Bid),
            state: SyncState::Unsynced,
            halted: false,
            pending_snapshot: None,
            overlap_strikes: 0,
            last_overlap_ask: None,
            last_overlap_bid: None,
            last_ask_fingerprint: None,
            last_bid_fingerprint: None,
            freeze_reported: false,
        }
    }

    /// Symbol this replica mirrors
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current sync state
    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SyncState) {
        self.state = state;
    }

    /// Whether the replica is synchronized and trustworthy
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.state == SyncState::Synced && !self.halted
    }

    /// Whether the staleness check has halted this replica
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stop applying deltas until the next reset
    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    /// Ask-side ladder
    #[must_use]
    pub fn asks(&self) -> &Ladder {
        &self.asks
    }

    /// Bid-side ladder
    #[must_use]
    pub fn bids(&self) -> &Ladder {
        &self.bids
    }

    /// Apply one delta's level changes to both sides.
    ///
    /// Changes carrying an id go through the id index; price-keyed changes go
    /// through the sorted upsert. Sequencing decisions belong to the caller.
    pub(crate) fn apply_changes(&mut self, delta: &DeltaEvent) {
        for change in &delta.asks {
            match change.id {
                Some(id) => self.asks.upsert_by_id(id, change.price, change.qty),
                None => self.asks.upsert_by_price(change.price, change.qty, None),
            }
        }
        for change in &delta.bids {
            match change.id {
                Some(id) => self.bids.upsert_by_id(id, change.price, change.qty),
                None => self.bids.upsert_by_price(change.price, change.qty, None),
            }
        }
    }

    /// Replace both sides from a snapshot
    pub(crate) fn load_snapshot(&mut self, snapshot: &SnapshotEvent) {
        self.asks.load_snapshot(&snapshot.asks);
        self.bids.load_snapshot(&snapshot.bids);
    }

    /// Clear everything and return to `Unsynced`.
    ///
    /// Used when the owning connection is rebuilt or a monitor raised a fatal
    /// violation; there is no in-place repair.
    pub fn reset(&mut self) {
        self.asks.clear();
        self.bids.clear();
        self.state = SyncState::Unsynced;
        self.halted = false;
        self.pending_snapshot = None;
        self.overlap_strikes = 0;
        self.last_overlap_ask = None;
        self.last_overlap_bid = None;
        self.last_ask_fingerprint = None;
        self.last_bid_fingerprint = None;
        self.freeze_reported = false;
    }

    /// Best level of each side
    #[must_use]
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            ask: self.asks.best().map(|(price, qty)| Quote { price, qty }),
            bid: self.bids.best().map(|(price, qty)| Quote { price, qty }),
        }
    }

    /// First `n` levels of each side, best first
    #[must_use]
    pub fn depth(&self, n: usize) -> Depth {
        Depth {
            asks: self.asks.top(n),
            bids: self.bids.top(n),
        }
    }
}
