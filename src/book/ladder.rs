//! Sorted price levels for one side of a book.
//!
//! This implementation uses `BTreeMap` for sorted price levels, providing:
//!
//! - O(log n) insertion, deletion, and lookup by price
//! - O(1) access to the best level (via `first_key_value` / `last_key_value`)
//! - Ordered iteration for depth-of-book queries
//!
//! An `FxHashMap` id index sits next to the tree for venues that key levels by
//! an independent order identifier instead of by price.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::Hasher;

use rustc_hash::{FxHashMap, FxHasher};

use crate::types::{LevelId, Price, PriceLevel, Qty};

/// Which side of the book a ladder holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Resting buy interest; best = highest price
    Bid,
    /// Resting sell interest; best = lowest price
    Ask,
}

/// Total-ordered map key over venue-native `f64` prices.
///
/// `total_cmp` makes the ordering total; NaN prices are a programming error
/// upstream and are debug-asserted at the mutation entry points.
#[derive(Debug, Clone, Copy)]
struct PriceKey(f64);

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Level {
    id: Option<LevelId>,
    qty: Qty,
}

/// Sorted, duplicate-free price levels for one side of one symbol.
///
/// Invariants, maintained by every mutation:
///
/// - every resident level has `qty > 0` (a zero/negative quantity in a change
///   means "remove")
/// - prices are unique and strictly monotonic along the ordered sequence
/// - a level id appears at most once per side
#[derive(Debug, Clone)]
pub struct Ladder {
    side: Side,
    /// Price levels, sorted ascending by price
    levels: BTreeMap<PriceKey, Level>,
    /// id -> price, for id-keyed venues
    ids: FxHashMap<LevelId, PriceKey>,
}

impl Ladder {
    /// Create an empty ladder for the given side
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Which side this ladder holds
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Number of resident levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the ladder holds no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remove every level
    pub fn clear(&mut self) {
        self.levels.clear();
        self.ids.clear();
    }

    /// Insert, overwrite, or remove the level at `price`.
    ///
    /// A nonzero `qty` inserts at the sorted position or overwrites an exact
    /// price match; `qty <= 0` removes an exact match and is a no-op when the
    /// price is absent.
    pub fn upsert_by_price(&mut self, price: Price, qty: Qty, id: Option<LevelId>) {
        debug_assert!(price.is_finite());
        let key = PriceKey(price);

        if qty <= 0.0 {
            if let Some(old) = self.levels.remove(&key) {
                if let Some(old_id) = old.id {
                    self.ids.remove(&old_id);
                }
            }
            return;
        }

        if let Some(old) = self.levels.insert(key, Level { id, qty }) {
            if old.id != id {
                if let Some(old_id) = old.id {
                    self.ids.remove(&old_id);
                }
            }
        }
        if let Some(id) = id {
            self.ids.insert(id, key);
        }
    }

    /// Insert, overwrite, or relocate the level identified by `id`.
    ///
    /// A known id with an unchanged price overwrites the quantity in place; a
    /// price change moves the level to its new sorted position. An unknown id
    /// inserts. `qty <= 0` removes.
    pub fn upsert_by_id(&mut self, id: LevelId, price: Price, qty: Qty) {
        debug_assert!(price.is_finite());

        if qty <= 0.0 {
            self.remove_by_id(id);
            return;
        }

        if let Some(&old_key) = self.ids.get(&id) {
            if old_key == PriceKey(price) {
                if let Some(level) = self.levels.get_mut(&old_key) {
                    level.qty = qty;
                }
                return;
            }
            self.levels.remove(&old_key);
        }
        self.upsert_by_price(price, qty, Some(id));
    }

    /// Remove the level identified by `id`; no-op when the id is unknown
    pub fn remove_by_id(&mut self, id: LevelId) {
        if let Some(key) = self.ids.remove(&id) {
            self.levels.remove(&key);
        }
    }

    /// Look up a level by id
    #[must_use]
    pub fn get_by_id(&self, id: LevelId) -> Option<PriceLevel> {
        let key = self.ids.get(&id)?;
        let level = self.levels.get(key)?;
        Some(PriceLevel {
            id: level.id,
            price: key.0,
            qty: level.qty,
        })
    }

    /// Look up a level by exact price
    #[must_use]
    pub fn get_by_price(&self, price: Price) -> Option<PriceLevel> {
        let key = PriceKey(price);
        let level = self.levels.get(&key)?;
        Some(PriceLevel {
            id: level.id,
            price: key.0,
            qty: level.qty,
        })
    }

    /// Replace the whole side with a snapshot.
    ///
    /// The caller guarantees the levels are already deduplicated; ordering is
    /// re-established by the tree regardless. Non-positive quantities are
    /// skipped rather than inserted.
    pub fn load_snapshot(&mut self, levels: &[PriceLevel]) {
        self.clear();
        for level in levels {
            if level.qty > 0.0 {
                self.upsert_by_price(level.price, level.qty, level.id);
            }
        }
    }

    /// Best level: lowest price for asks, highest for bids
    #[must_use]
    pub fn best(&self) -> Option<(Price, Qty)> {
        let (key, level) = match self.side {
            Side::Ask => self.levels.first_key_value()?,
            Side::Bid => self.levels.last_key_value()?,
        };
        Some((key.0, level.qty))
    }

    /// Visit the top `n` levels, best first, without allocating
    fn for_top(&self, n: usize, mut f: impl FnMut(Price, &Level)) {
        match self.side {
            Side::Ask => {
                for (key, level) in self.levels.iter().take(n) {
                    f(key.0, level);
                }
            }
            Side::Bid => {
                for (key, level) in self.levels.iter().rev().take(n) {
                    f(key.0, level);
                }
            }
        }
    }

    /// The top `n` levels, best first
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<PriceLevel> {
        let mut out = Vec::with_capacity(n.min(self.levels.len()));
        self.for_top(n, |price, level| {
            out.push(PriceLevel {
                id: level.id,
                price,
                qty: level.qty,
            });
        });
        out
    }

    /// Stable fingerprint of the top `n` levels.
    ///
    /// Hashes price and quantity bits in best-first order; two ladders whose
    /// visible top differs in any way produce different fingerprints. Used by
    /// the frozen-feed monitor, so it must not allocate.
    #[must_use]
    pub fn fingerprint(&self, n: usize) -> u64 {
        let mut hasher = FxHasher::default();
        self.for_top(n, |price, level| {
            hasher.write_u64(price.to_bits());
            hasher.write_u64(level.qty.to_bits());
        });
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(ladder: &Ladder) -> Vec<f64> {
        ladder.top(usize::MAX).iter().map(|l| l.price).collect()
    }

    #[test]
    fn test_ask_sort_invariant() {
        let mut asks = Ladder::new(Side::Ask);
        for price in [101.0, 99.5, 100.0, 100.5, 99.9, 100.0] {
            asks.upsert_by_price(price, 1.0, None);
        }

        let ps = prices(&asks);
        assert_eq!(ps, vec![99.5, 99.9, 100.0, 100.5, 101.0]);
        assert!(ps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bid_sort_invariant() {
        let mut bids = Ladder::new(Side::Bid);
        for price in [99.0, 100.5, 99.5, 100.0, 100.5] {
            bids.upsert_by_price(price, 2.0, None);
        }

        let ps = prices(&bids);
        assert_eq!(ps, vec![100.5, 100.0, 99.5, 99.0]);
        assert!(ps.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_zero_qty_removes() {
        let mut asks = Ladder::new(Side::Ask);
        asks.upsert_by_price(100.0, 1.0, None);

        asks.upsert_by_price(100.0, 0.0, None);
        assert!(asks.is_empty());

        // Removing an absent price is a no-op
        asks.upsert_by_price(100.0, 2.0, None);
        asks.upsert_by_price(101.0, 0.0, None);
        assert_eq!(prices(&asks), vec![100.0]);
    }

    #[test]
    fn test_insertion_between_levels() {
        let mut asks = Ladder::new(Side::Ask);
        asks.upsert_by_price(100.0, 1.0, None);
        asks.upsert_by_price(101.0, 2.0, None);

        asks.upsert_by_price(100.5, 5.0, None);

        let top = asks.top(3);
        assert_eq!(
            top.iter().map(|l| (l.price, l.qty)).collect::<Vec<_>>(),
            vec![(100.0, 1.0), (100.5, 5.0), (101.0, 2.0)]
        );
    }

    #[test]
    fn test_upsert_by_id_overwrites_in_place() {
        let mut asks = Ladder::new(Side::Ask);
        asks.upsert_by_id(42, 99.0, 3.0);
        asks.upsert_by_id(42, 99.0, 5.0);

        assert_eq!(asks.len(), 1);
        let level = asks.get_by_id(42).unwrap();
        assert_eq!(level.price, 99.0);
        assert_eq!(level.qty, 5.0);
    }

    #[test]
    fn test_upsert_by_id_relocates_on_price_change() {
        let mut asks = Ladder::new(Side::Ask);
        asks.upsert_by_id(1, 100.0, 1.0);
        asks.upsert_by_id(2, 101.0, 1.0);

        asks.upsert_by_id(2, 99.0, 4.0);

        assert_eq!(prices(&asks), vec![99.0, 100.0]);
        assert_eq!(asks.get_by_id(2).unwrap().price, 99.0);
        assert!(asks.get_by_price(101.0).is_none());
    }

    #[test]
    fn test_remove_by_id() {
        let mut bids = Ladder::new(Side::Bid);
        bids.upsert_by_id(7, 100.0, 1.0);

        bids.remove_by_id(7);
        assert!(bids.is_empty());
        assert!(bids.get_by_id(7).is_none());

        // Unknown id is a no-op
        bids.remove_by_id(7);
    }

    #[test]
    fn test_price_overwrite_replaces_id_mapping() {
        let mut asks = Ladder::new(Side::Ask);
        asks.upsert_by_price(100.0, 1.0, Some(1));
        asks.upsert_by_price(100.0, 2.0, Some(2));

        assert!(asks.get_by_id(1).is_none());
        assert_eq!(asks.get_by_id(2).unwrap().qty, 2.0);
        assert_eq!(asks.len(), 1);
    }

    #[test]
    fn test_load_snapshot_replaces_contents() {
        let mut bids = Ladder::new(Side::Bid);
        bids.upsert_by_price(50.0, 1.0, None);

        bids.load_snapshot(&[
            PriceLevel::new(100.0, 1.0),
            PriceLevel::new(99.0, 2.0),
            PriceLevel::new(98.0, 0.0), // empty levels are dropped
        ]);

        assert_eq!(prices(&bids), vec![100.0, 99.0]);
        assert!(bids.get_by_price(50.0).is_none());
    }

    #[test]
    fn test_best() {
        let mut asks = Ladder::new(Side::Ask);
        let mut bids = Ladder::new(Side::Bid);
        assert_eq!(asks.best(), None);

        for price in [100.0, 101.0, 102.0] {
            asks.upsert_by_price(price, 1.0, None);
            bids.upsert_by_price(price - 3.0, 1.0, None);
        }

        assert_eq!(asks.best(), Some((100.0, 1.0)));
        assert_eq!(bids.best(), Some((99.0, 1.0)));
    }

    #[test]
    fn test_fingerprint_tracks_top_levels() {
        let mut asks = Ladder::new(Side::Ask);
        for i in 0..20 {
            asks.upsert_by_price(100.0 + i as f64, 1.0, None);
        }
        let fp = asks.fingerprint(10);

        // A change below the fingerprinted depth is invisible
        asks.upsert_by_price(115.0, 9.0, None);
        assert_eq!(asks.fingerprint(10), fp);

        // A change inside the top 10 is visible
        asks.upsert_by_price(100.0, 2.0, None);
        assert_ne!(asks.fingerprint(10), fp);
    }
}
