//! Bootstrap and steady-state synchronization strategies.
//!
//! Every replica walks the same state machine — `Unsynced` →
//! `SnapshotPending` → `Synced`, back to `Unsynced` on any reset — but venues
//! bootstrap it in one of two ways:
//!
//! - **push snapshot**: the venue sends a full snapshot as the first frame of
//!   a subscription, then deltas. No request/response call is involved.
//! - **pull snapshot**: the stream carries only deltas, each tagged with the
//!   update-id span it covers; a full snapshot (tagged with its own last
//!   update id) is fetched separately and reconciled against the span tags.
//!
//! The strategy is selected per venue at construction time via
//! [`SyncMode`](crate::config::SyncMode); the rest of the engine only sees the
//! [`SyncStrategy`] trait. Sequence gaps are not errors: they restart
//! bootstrap silently and surface only as `tracing` resynchronization events.

use tracing::{debug, info, warn};

use crate::config::SyncMode;
use crate::types::{DeltaEvent, SnapshotEvent};

use super::replica::{BookReplica, SyncState};

/// What the caller must do after handing a delta to a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Nothing; the delta was applied or discarded
    None,
    /// Start an asynchronous snapshot fetch for this replica's symbol.
    ///
    /// The fetch must run outside any lock held over the replica; its result
    /// comes back through [`SyncStrategy::on_snapshot`].
    FetchSnapshot,
}

/// One venue's way of driving a replica through bootstrap and steady state.
///
/// Implementations decide everything about sequencing; the replica only
/// provides mutation primitives. Calls arrive strictly in stream order from a
/// single writer, always under the owning entry's write lock.
pub trait SyncStrategy: Send + Sync {
    /// Feed one inbound delta
    fn on_delta(&mut self, book: &mut BookReplica, delta: &DeltaEvent) -> SyncAction;

    /// Feed one snapshot (inline frame or completed fetch)
    fn on_snapshot(&mut self, book: &mut BookReplica, snapshot: SnapshotEvent);
}

/// Build the strategy for a venue's sync mode
pub fn strategy_for(mode: SyncMode) -> Box<dyn SyncStrategy> {
    match mode {
        SyncMode::PushSnapshot => Box::new(PushSync),
        SyncMode::PullSnapshot => Box::new(PullSync),
    }
}

/// Strategy A: the venue pushes a full snapshot as the first frame.
///
/// The first inline snapshot loads the book and the replica is synced
/// immediately; deltas seen before it are discarded.
#[derive(Debug, Default)]
pub struct PushSync;

impl SyncStrategy for PushSync {
    fn on_delta(&mut self, book: &mut BookReplica, delta: &DeltaEvent) -> SyncAction {
        if book.state() == SyncState::Synced {
            book.apply_changes(delta);
        } else {
            debug!(symbol = book.symbol(), "discarding delta before snapshot");
        }
        SyncAction::None
    }

    fn on_snapshot(&mut self, book: &mut BookReplica, snapshot: SnapshotEvent) {
        book.load_snapshot(&snapshot);
        book.set_state(SyncState::Synced);
        info!(symbol = book.symbol(), "book synchronized from pushed snapshot");
    }
}

/// Strategy B: deltas carry `[first, last]` update-id spans; snapshots are
/// fetched out of band and reconciled against them.
///
/// Bootstrap: the first delta seen while `Unsynced` requests a fetch and
/// moves to `SnapshotPending`; deltas that arrive while the fetch is
/// outstanding are discarded, not buffered (this matches the documented
/// local-book procedure of the venues using this scheme, but deserves
/// venue-by-venue verification). Once a snapshot with last update id `S` is
/// staged, each delta span `[U, u]` is reconciled:
///
/// - `S < U`: a gap opened before the fetch completed; drop the snapshot and
///   fetch again
/// - `U <= S <= u`: the delta covers the snapshot point; load the snapshot,
///   apply this delta on top, and the replica is synced
/// - `S > u`: the delta predates the snapshot; drop the delta and keep waiting
///
/// Once synced, deltas apply directly with no further sequence checks until
/// the next reset.
#[derive(Debug, Default)]
pub struct PullSync;

impl SyncStrategy for PullSync {
    fn on_delta(&mut self, book: &mut BookReplica, delta: &DeltaEvent) -> SyncAction {
        match book.state() {
            SyncState::Synced => {
                book.apply_changes(delta);
                SyncAction::None
            }
            SyncState::Unsynced => {
                book.pending_snapshot = None;
                book.set_state(SyncState::SnapshotPending);
                debug!(symbol = book.symbol(), "first delta while unsynced, requesting snapshot");
                SyncAction::FetchSnapshot
            }
            SyncState::SnapshotPending => self.reconcile(book, delta),
        }
    }

    fn on_snapshot(&mut self, book: &mut BookReplica, snapshot: SnapshotEvent) {
        // Completed fetches are only meaningful while we wait for one; a
        // result landing after a reset is stale and dropped (there is no
        // fetch cancellation).
        if book.state() == SyncState::SnapshotPending {
            debug!(
                symbol = book.symbol(),
                snapshot_seq = snapshot.seq,
                "staging fetched snapshot for reconciliation"
            );
            book.pending_snapshot = Some(snapshot);
        } else {
            debug!(
                symbol = book.symbol(),
                state = ?book.state(),
                "discarding snapshot fetched for a previous bootstrap"
            );
        }
    }
}

impl PullSync {
    fn reconcile(&mut self, book: &mut BookReplica, delta: &DeltaEvent) -> SyncAction {
        let Some(range) = delta.seq else {
            warn!(
                symbol = book.symbol(),
                "pull-mode delta without a sequence range, discarding"
            );
            return SyncAction::None;
        };

        let snapshot_seq = match book.pending_snapshot.as_ref().map(|s| s.seq) {
            // Fetch still in flight: inspect-and-discard until it lands
            None => return SyncAction::None,
            Some(Some(seq)) => seq,
            Some(None) => {
                // A snapshot without a sequence cannot be reconciled; treat it
                // like a stale one and fetch again.
                warn!(
                    symbol = book.symbol(),
                    "fetched snapshot carries no sequence, refetching"
                );
                book.pending_snapshot = None;
                return SyncAction::FetchSnapshot;
            }
        };

        if snapshot_seq < range.first {
            // A gap opened between the snapshot and the live stream while the
            // fetch was outstanding. Routine during bursts: drop the snapshot
            // and try again. This delta is the retry trigger.
            info!(
                symbol = book.symbol(),
                snapshot_seq,
                delta_first = range.first,
                "snapshot predates the stream, resynchronizing"
            );
            book.pending_snapshot = None;
            SyncAction::FetchSnapshot
        } else if snapshot_seq <= range.last {
            // This delta's span covers the snapshot point, so its contents
            // are the correct next state on top of the snapshot.
            if let Some(snapshot) = book.pending_snapshot.take() {
                book.load_snapshot(&snapshot);
                book.set_state(SyncState::Synced);
                book.apply_changes(delta);
                info!(
                    symbol = book.symbol(),
                    snapshot_seq,
                    "book synchronized from fetched snapshot"
                );
            }
            SyncAction::None
        } else {
            // Delta predates the snapshot; later deltas will reach it.
            debug!(
                symbol = book.symbol(),
                snapshot_seq,
                delta_last = range.last,
                "discarding delta older than staged snapshot"
            );
            SyncAction::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LevelChange, PriceLevel, SequenceRange};

    fn delta(first: u64, last: u64, asks: Vec<LevelChange>) -> DeltaEvent {
        DeltaEvent {
            symbol: "TEST".to_string(),
            origin_ts_ms: 0,
            seq: Some(SequenceRange { first, last }),
            asks,
            bids: vec![],
        }
    }

    fn snapshot(seq: u64) -> SnapshotEvent {
        SnapshotEvent {
            symbol: "TEST".to_string(),
            seq: Some(seq),
            asks: vec![PriceLevel::new(100.0, 1.0)],
            bids: vec![PriceLevel::new(99.0, 1.0)],
        }
    }

    #[test]
    fn test_push_syncs_on_first_snapshot() {
        let mut strategy = PushSync;
        let mut book = BookReplica::new("TEST");

        // Deltas before the snapshot are discarded
        let early = DeltaEvent {
            symbol: "TEST".to_string(),
            origin_ts_ms: 0,
            seq: None,
            asks: vec![LevelChange::new(100.0, 5.0)],
            bids: vec![],
        };
        assert_eq!(strategy.on_delta(&mut book, &early), SyncAction::None);
        assert!(book.asks().is_empty());

        strategy.on_snapshot(
            &mut book,
            SnapshotEvent {
                symbol: "TEST".to_string(),
                seq: None,
                asks: vec![PriceLevel::new(101.0, 2.0)],
                bids: vec![PriceLevel::new(100.0, 3.0)],
            },
        );
        assert_eq!(book.state(), SyncState::Synced);

        strategy.on_delta(
            &mut book,
            &DeltaEvent {
                symbol: "TEST".to_string(),
                origin_ts_ms: 0,
                seq: None,
                asks: vec![LevelChange::new(100.5, 1.0)],
                bids: vec![],
            },
        );
        assert_eq!(book.top_of_book().ask.unwrap().price, 100.5);
    }

    #[test]
    fn test_pull_first_delta_requests_fetch() {
        let mut strategy = PullSync;
        let mut book = BookReplica::new("TEST");

        let action = strategy.on_delta(&mut book, &delta(1, 2, vec![]));
        assert_eq!(action, SyncAction::FetchSnapshot);
        assert_eq!(book.state(), SyncState::SnapshotPending);

        // Fetch outstanding: deltas are inspected but discarded
        let action = strategy.on_delta(&mut book, &delta(3, 4, vec![LevelChange::new(1.0, 1.0)]));
        assert_eq!(action, SyncAction::None);
        assert!(book.asks().is_empty());
    }

    #[test]
    fn test_pull_covering_delta_loads_and_applies() {
        let mut strategy = PullSync;
        let mut book = BookReplica::new("TEST");

        strategy.on_delta(&mut book, &delta(490, 491, vec![]));
        strategy.on_snapshot(&mut book, snapshot(500));

        // [495, 505] covers snapshot seq 500: load + apply in the same step
        let action = strategy.on_delta(
            &mut book,
            &delta(495, 505, vec![LevelChange::new(100.5, 2.0)]),
        );
        assert_eq!(action, SyncAction::None);
        assert_eq!(book.state(), SyncState::Synced);

        // Snapshot contents plus the triggering delta's own changes
        assert_eq!(book.top_of_book().ask.unwrap().price, 100.0);
        assert_eq!(book.asks().get_by_price(100.5).unwrap().qty, 2.0);
    }

    #[test]
    fn test_pull_gap_discards_snapshot_and_refetches() {
        let mut strategy = PullSync;
        let mut book = BookReplica::new("TEST");

        strategy.on_delta(&mut book, &delta(490, 491, vec![]));
        strategy.on_snapshot(&mut book, snapshot(500));

        // U = 501 > snapshot seq 500: the snapshot is already stale
        let action = strategy.on_delta(&mut book, &delta(501, 510, vec![]));
        assert_eq!(action, SyncAction::FetchSnapshot);
        assert_eq!(book.state(), SyncState::SnapshotPending);
        assert!(book.pending_snapshot.is_none());
        assert!(book.asks().is_empty());
    }

    #[test]
    fn test_pull_discards_deltas_older_than_snapshot() {
        let mut strategy = PullSync;
        let mut book = BookReplica::new("TEST");

        strategy.on_delta(&mut book, &delta(480, 481, vec![]));
        strategy.on_snapshot(&mut book, snapshot(500));

        // u = 490 < snapshot seq 500: delta predates the snapshot
        let action = strategy.on_delta(
            &mut book,
            &delta(485, 490, vec![LevelChange::new(1.0, 1.0)]),
        );
        assert_eq!(action, SyncAction::None);
        assert_eq!(book.state(), SyncState::SnapshotPending);
        assert!(book.pending_snapshot.is_some());

        // A later covering delta still syncs
        strategy.on_delta(&mut book, &delta(498, 502, vec![]));
        assert_eq!(book.state(), SyncState::Synced);
    }

    #[test]
    fn test_pull_no_sequence_checks_once_synced() {
        let mut strategy = PullSync;
        let mut book = BookReplica::new("TEST");

        strategy.on_delta(&mut book, &delta(1, 1, vec![]));
        strategy.on_snapshot(&mut book, snapshot(500));
        strategy.on_delta(&mut book, &delta(498, 502, vec![]));
        assert_eq!(book.state(), SyncState::Synced);

        // Arbitrary spans apply directly after sync
        strategy.on_delta(
            &mut book,
            &delta(9000, 9001, vec![LevelChange::new(100.5, 7.0)]),
        );
        assert_eq!(book.asks().get_by_price(100.5).unwrap().qty, 7.0);
    }

    #[test]
    fn test_pull_snapshot_after_reset_is_discarded() {
        let mut strategy = PullSync;
        let mut book = BookReplica::new("TEST");

        strategy.on_delta(&mut book, &delta(1, 1, vec![]));
        book.reset();

        strategy.on_snapshot(&mut book, snapshot(500));
        assert!(book.pending_snapshot.is_none());
        assert_eq!(book.state(), SyncState::Unsynced);
    }

    #[test]
    fn test_strategy_for_mode() {
        let mut book = BookReplica::new("TEST");
        let mut strategy = strategy_for(SyncMode::PushSnapshot);
        strategy.on_snapshot(&mut book, snapshot(1));
        assert_eq!(book.state(), SyncState::Synced);

        let mut book = BookReplica::new("TEST");
        let mut strategy = strategy_for(SyncMode::PullSnapshot);
        let action = strategy.on_delta(&mut book, &delta(1, 2, vec![]));
        assert_eq!(action, SyncAction::FetchSnapshot);
    }
}
