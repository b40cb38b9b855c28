//! Book registry for one venue session.
//!
//! This module provides [`BookManager`], a thread-safe container for the
//! replicas of every symbol a session replicates, wired to the venue's sync
//! strategy.
//!
//! # Design
//!
//! The manager uses `parking_lot::RwLock` around an `FxHashMap` of per-symbol
//! entries, each behind its own lock: the feed task takes an entry's write
//! lock to apply a delta, monitor sweeps and callers take short read or write
//! locks, and no lock is ever held across an `await`. Snapshot fetches run on
//! spawned tasks and re-enter through [`BookManager::process_snapshot`].
//!
//! # Sequencing
//!
//! Each replica has exactly one ordered source of truth — the delta stream of
//! its (venue, symbol). The manager never reorders: whatever the feed task
//! hands it is applied in call order under the entry lock.

use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::{SyncMode, VenueConfig};
use crate::error::Error;
use crate::types::{now_ms, DeltaEvent, HealthAlert, SnapshotEvent};

use super::health;
use super::replica::{BookReplica, Depth, SyncState, TopOfBook};
use super::sync::{strategy_for, SyncAction, SyncStrategy};

struct BookEntry {
    replica: BookReplica,
    strategy: Box<dyn SyncStrategy>,
}

/// Thread-safe registry of book replicas for one venue.
///
/// Safe to share across tasks via `Arc<BookManager>`; individual replicas are
/// protected by per-entry locks for concurrent read access.
pub struct BookManager {
    /// Replicas by symbol
    books: RwLock<FxHashMap<String, RwLock<BookEntry>>>,
    mode: SyncMode,
    staleness_window_ms: u64,
    fingerprint_depth: usize,
}

impl std::fmt::Debug for BookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookManager")
            .field("mode", &self.mode)
            .field("symbols", &self.len())
            .finish()
    }
}

impl BookManager {
    /// Create an empty manager for the given sync mode
    #[must_use]
    pub fn new(mode: SyncMode) -> Self {
        Self {
            books: RwLock::new(FxHashMap::default()),
            mode,
            staleness_window_ms: 5_000,
            fingerprint_depth: 10,
        }
    }

    /// Set the staleness window for the inline freshness check
    #[must_use]
    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window_ms = window.as_millis() as u64;
        self
    }

    /// Set the freeze-fingerprint depth
    #[must_use]
    pub fn with_fingerprint_depth(mut self, depth: usize) -> Self {
        self.fingerprint_depth = depth;
        self
    }

    /// Build a manager from a venue config, tracking its symbols
    #[must_use]
    pub fn from_config(config: &VenueConfig) -> Self {
        let manager = Self::new(config.sync_mode())
            .with_staleness_window(config.staleness_window())
            .with_fingerprint_depth(config.fingerprint_depth());
        for symbol in config.symbols() {
            manager.track(symbol.as_str());
        }
        manager
    }

    /// Start replicating a symbol
    ///
    /// Creates an empty replica in `Unsynced` state; idempotent.
    pub fn track(&self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        let mode = self.mode;
        let mut books = self.books.write();
        books.entry(symbol.clone()).or_insert_with(|| {
            RwLock::new(BookEntry {
                replica: BookReplica::new(symbol),
                strategy: strategy_for(mode),
            })
        });
    }

    /// Stop replicating a symbol and drop its replica
    pub fn untrack(&self, symbol: &str) {
        let mut books = self.books.write();
        books.remove(symbol);
    }

    /// Feed one inbound delta.
    ///
    /// Runs the inline staleness check, then hands the delta to the symbol's
    /// strategy in arrival order.
    ///
    /// # Returns
    ///
    /// - `Ok(SyncAction::FetchSnapshot)` — the caller must start an async
    ///   snapshot fetch for this symbol (outside any lock)
    /// - `Ok(SyncAction::None)` — applied, discarded, or symbol not tracked
    /// - `Err(Error::StaleFeed)` — the delta was too old; the replica is
    ///   halted until reset and the connection should be rebuilt
    pub fn process_delta(&self, delta: &DeltaEvent) -> Result<SyncAction, Error> {
        let books = self.books.read();
        let Some(entry) = books.get(&delta.symbol) else {
            return Ok(SyncAction::None);
        };
        let mut entry = entry.write();

        // A halted replica stays untouched until the reconnect resets it
        if entry.replica.is_halted() {
            return Ok(SyncAction::None);
        }

        if let Some(age_ms) = health::stale_age(delta, now_ms(), self.staleness_window_ms) {
            entry.replica.halt();
            return Err(Error::StaleFeed {
                symbol: delta.symbol.clone(),
                age_ms,
            });
        }

        let BookEntry { replica, strategy } = &mut *entry;
        Ok(strategy.on_delta(replica, delta))
    }

    /// Feed one snapshot (inline frame or completed fetch)
    pub fn process_snapshot(&self, snapshot: SnapshotEvent) {
        let books = self.books.read();
        let Some(entry) = books.get(&snapshot.symbol) else {
            debug!(symbol = %snapshot.symbol, "snapshot for untracked symbol");
            return;
        };
        let mut entry = entry.write();
        if entry.replica.is_halted() {
            return;
        }
        let BookEntry { replica, strategy } = &mut *entry;
        strategy.on_snapshot(replica, snapshot);
    }

    /// Record that a snapshot fetch failed.
    ///
    /// Drops the replica back to `Unsynced` so the next delta re-requests;
    /// without this a failed fetch would leave bootstrap waiting forever.
    pub fn fetch_failed(&self, symbol: &str) {
        let books = self.books.read();
        if let Some(entry) = books.get(symbol) {
            let mut entry = entry.write();
            if entry.replica.state() == SyncState::SnapshotPending {
                entry.replica.set_state(SyncState::Unsynced);
            }
        }
    }

    /// Best level of each side, if the symbol is tracked
    #[must_use]
    pub fn top_of_book(&self, symbol: &str) -> Option<TopOfBook> {
        let books = self.books.read();
        books.get(symbol).map(|e| e.read().replica.top_of_book())
    }

    /// First `n` levels of each side, if the symbol is tracked
    #[must_use]
    pub fn depth(&self, symbol: &str, n: usize) -> Option<Depth> {
        let books = self.books.read();
        books.get(symbol).map(|e| e.read().replica.depth(n))
    }

    /// Whether a symbol's replica is synchronized and trustworthy
    #[must_use]
    pub fn is_synced(&self, symbol: &str) -> bool {
        let books = self.books.read();
        books
            .get(symbol)
            .map(|e| e.read().replica.is_synced())
            .unwrap_or(false)
    }

    /// Sync state of a symbol's replica
    #[must_use]
    pub fn state(&self, symbol: &str) -> Option<SyncState> {
        let books = self.books.read();
        books.get(symbol).map(|e| e.read().replica.state())
    }

    /// Reset one replica to `Unsynced`
    pub fn reset(&self, symbol: &str) {
        let books = self.books.read();
        if let Some(entry) = books.get(symbol) {
            entry.write().replica.reset();
            info!(symbol, "replica reset, resynchronizing");
        }
    }

    /// Reset every replica to `Unsynced`.
    ///
    /// Called when the owning transport connection is rebuilt.
    pub fn reset_all(&self) {
        let books = self.books.read();
        for entry in books.values() {
            entry.write().replica.reset();
        }
        info!(symbols = books.len(), "all replicas reset, resynchronizing");
    }

    /// One frozen-feed tick over every synchronized replica
    #[must_use]
    pub fn freeze_sweep(&self) -> Vec<HealthAlert> {
        self.sweep(|replica| health::check_frozen(replica, self.fingerprint_depth))
    }

    /// One crossed-book tick over every synchronized replica
    #[must_use]
    pub fn cross_sweep(&self) -> Vec<HealthAlert> {
        self.sweep(health::check_crossed)
    }

    fn sweep(&self, check: impl Fn(&mut BookReplica) -> Option<HealthAlert>) -> Vec<HealthAlert> {
        let mut alerts = Vec::new();
        let books = self.books.read();
        for entry in books.values() {
            let mut entry = entry.write();
            // Monitors only judge books that claim to be live
            if !entry.replica.is_synced() {
                continue;
            }
            if let Some(alert) = check(&mut entry.replica) {
                alerts.push(alert);
            }
        }
        alerts
    }

    /// Number of tracked symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    /// Whether no symbols are tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }

    /// All tracked symbols
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.books.read().keys().cloned().collect()
    }
}
