//! Health checks over a book replica.
//!
//! Three independent detectors, all pure observers of the replica's ladders:
//!
//! - an inline staleness check on every inbound delta's origin timestamp
//! - a frozen-feed check comparing top-of-book fingerprints across ticks
//! - a crossed-book check with a two-strike counter and a stale-level guard
//!
//! The periodic checks are driven by the session's monitor timers; they write
//! only the replica's monitor bookkeeping fields, never book contents. All
//! three raise through the same [`HealthAlert`] channel and are
//! connection-fatal: the owning connection tears down, every replica resets,
//! and bootstrap starts over.

use crate::types::{AlertKind, DeltaEvent, HealthAlert, TimestampMs};

use super::replica::BookReplica;

/// Age of a delta relative to `now`, when it exceeds the freshness window.
///
/// Returns `Some(age_ms)` if the delta is too old to trust; the caller halts
/// the replica and raises [`AlertKind::StaleFeed`].
#[must_use]
pub fn stale_age(delta: &DeltaEvent, now_ms: TimestampMs, window_ms: u64) -> Option<u64> {
    let age = now_ms.saturating_sub(delta.origin_ts_ms);
    (age > window_ms).then_some(age)
}

/// One frozen-feed tick: fingerprint the top `depth` levels of both sides and
/// compare with the previous tick.
///
/// Raises once per freeze episode: identical fingerprints on consecutive ticks
/// raise [`AlertKind::FrozenBook`], after which the episode is marked reported
/// until a real change clears it.
pub fn check_frozen(book: &mut BookReplica, depth: usize) -> Option<HealthAlert> {
    let ask_fp = book.asks().fingerprint(depth);
    let bid_fp = book.bids().fingerprint(depth);

    let frozen = book.last_ask_fingerprint == Some(ask_fp)
        && book.last_bid_fingerprint == Some(bid_fp);
    book.last_ask_fingerprint = Some(ask_fp);
    book.last_bid_fingerprint = Some(bid_fp);

    if !frozen {
        book.freeze_reported = false;
        return None;
    }
    if book.freeze_reported {
        return None;
    }
    book.freeze_reported = true;
    Some(HealthAlert {
        symbol: book.symbol().to_string(),
        kind: AlertKind::FrozenBook,
        detail: format!("top {depth} levels of both sides unchanged across a monitor interval"),
    })
}

/// One crossed-book tick.
///
/// A single crossed observation (`best ask <= best bid`) is tolerated and only
/// recorded — a transient cross can come from the race between two delta
/// applications. A second consecutive crossed tick raises
/// [`AlertKind::CrossedBook`] unconditionally. An un-crossed tick whose best
/// bid or best ask still equals the recorded overlap price also raises: the
/// level "un-crossed" at exactly the stale price. No-op while either side is
/// empty.
pub fn check_crossed(book: &mut BookReplica) -> Option<HealthAlert> {
    let (Some((ask, _)), Some((bid, _))) = (book.asks().best(), book.bids().best()) else {
        return None;
    };

    if ask <= bid {
        if book.overlap_strikes == 0 {
            book.overlap_strikes = 1;
            book.last_overlap_ask = Some(ask);
            book.last_overlap_bid = Some(bid);
            return None;
        }
        return Some(crossed_alert(book, ask, bid));
    }

    if book.last_overlap_bid == Some(bid) || book.last_overlap_ask == Some(ask) {
        return Some(crossed_alert(book, ask, bid));
    }

    if book.overlap_strikes != 0 {
        book.overlap_strikes = 0;
        book.last_overlap_ask = None;
        book.last_overlap_bid = None;
    }
    None
}

fn crossed_alert(book: &BookReplica, ask: f64, bid: f64) -> HealthAlert {
    HealthAlert {
        symbol: book.symbol().to_string(),
        kind: AlertKind::CrossedBook,
        detail: format!("best ask {ask} vs best bid {bid} across consecutive checks"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LevelChange, SnapshotEvent, PriceLevel};

    fn synced_book(ask: f64, bid: f64) -> BookReplica {
        let mut book = BookReplica::new("TEST");
        book.load_snapshot(&SnapshotEvent {
            symbol: "TEST".to_string(),
            seq: None,
            asks: vec![PriceLevel::new(ask, 1.0)],
            bids: vec![PriceLevel::new(bid, 1.0)],
        });
        book
    }

    fn touch_ask(book: &mut BookReplica, price: f64, qty: f64) {
        book.apply_changes(&DeltaEvent {
            symbol: "TEST".to_string(),
            origin_ts_ms: 0,
            seq: None,
            asks: vec![LevelChange::new(price, qty)],
            bids: vec![],
        });
    }

    fn touch_bid(book: &mut BookReplica, price: f64, qty: f64) {
        book.apply_changes(&DeltaEvent {
            symbol: "TEST".to_string(),
            origin_ts_ms: 0,
            seq: None,
            asks: vec![],
            bids: vec![LevelChange::new(price, qty)],
        });
    }

    #[test]
    fn test_stale_age() {
        let mut delta = DeltaEvent {
            symbol: "TEST".to_string(),
            origin_ts_ms: 10_000,
            seq: None,
            asks: vec![],
            bids: vec![],
        };

        assert_eq!(stale_age(&delta, 14_000, 5_000), None);
        assert_eq!(stale_age(&delta, 16_000, 5_000), Some(6_000));

        // A venue clock slightly ahead of ours is not stale
        delta.origin_ts_ms = 20_000;
        assert_eq!(stale_age(&delta, 16_000, 5_000), None);
    }

    #[test]
    fn test_frozen_raises_once_per_episode() {
        let mut book = synced_book(101.0, 100.0);

        assert!(check_frozen(&mut book, 10).is_none()); // first tick records
        let alert = check_frozen(&mut book, 10).expect("second identical tick raises");
        assert_eq!(alert.kind, AlertKind::FrozenBook);

        // Still frozen, already reported: no repeat
        assert!(check_frozen(&mut book, 10).is_none());
        assert!(check_frozen(&mut book, 10).is_none());

        // A real change clears the episode...
        touch_ask(&mut book, 101.0, 2.0);
        assert!(check_frozen(&mut book, 10).is_none());

        // ...and a fresh freeze raises again
        assert!(check_frozen(&mut book, 10).is_some());
    }

    #[test]
    fn test_crossed_two_strike() {
        let mut book = synced_book(99.0, 100.0); // ask <= bid

        assert!(check_crossed(&mut book).is_none()); // first strike tolerated
        let alert = check_crossed(&mut book).expect("second crossed tick raises");
        assert_eq!(alert.kind, AlertKind::CrossedBook);
    }

    #[test]
    fn test_second_strike_raises_at_different_prices() {
        let mut book = synced_book(99.0, 100.0);
        assert!(check_crossed(&mut book).is_none());

        // Still crossed, different prices: raises regardless
        touch_ask(&mut book, 99.0, 0.0);
        touch_ask(&mut book, 98.0, 1.0);
        assert!(check_crossed(&mut book).is_some());
    }

    #[test]
    fn test_transient_cross_then_clean_tick() {
        let mut book = synced_book(99.0, 100.0);
        assert!(check_crossed(&mut book).is_none()); // records ask=99, bid=100

        // Book recovers at genuinely new prices on both sides: the counter
        // clears and nothing is raised
        touch_ask(&mut book, 99.0, 0.0);
        touch_ask(&mut book, 101.0, 1.0);
        touch_bid(&mut book, 100.0, 0.0);
        touch_bid(&mut book, 100.5, 1.0);

        assert!(check_crossed(&mut book).is_none());
        assert_eq!(book.overlap_strikes, 0);
        assert_eq!(book.last_overlap_ask, None);

        // A later lone cross starts a fresh episode, still tolerated once
        touch_bid(&mut book, 102.0, 1.0);
        assert!(check_crossed(&mut book).is_none());
    }

    #[test]
    fn test_uncrossed_at_recorded_price_still_raises() {
        let mut book = synced_book(99.0, 100.0);
        assert!(check_crossed(&mut book).is_none()); // records ask=99, bid=100

        // Ask side un-crosses but the bid still sits at the recorded 100.0:
        // suspicious, raises anyway
        touch_ask(&mut book, 99.0, 0.0);
        touch_ask(&mut book, 100.5, 1.0);
        let alert = check_crossed(&mut book).expect("stale un-cross raises");
        assert_eq!(alert.kind, AlertKind::CrossedBook);
    }

    #[test]
    fn test_crossed_noop_when_side_empty() {
        let mut book = BookReplica::new("TEST");
        assert!(check_crossed(&mut book).is_none());

        touch_ask(&mut book, 100.0, 1.0); // only asks
        assert!(check_crossed(&mut book).is_none());
        assert_eq!(book.overlap_strikes, 0);
    }
}
