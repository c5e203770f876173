//! Per-symbol order book with versioned lock-free reads
//!
//! The book is written by exactly one thread (the symbol worker) and read
//! by any number of query threads. Writers bracket every apply with two
//! version bumps so the count is odd while a write is in flight; readers
//! retry until they observe the same even version on both sides of the
//! read. Both sides are pre-reserved to [`MAX_DEPTH`] so the backing
//! storage never reallocates under a concurrent reader.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use rust_decimal::Decimal;

use super::OrderBookMetrics;
use crate::model::{
    MarketDataEntry, MarketDataIncrement, MarketDataSnapshot, Price, PriceLevel, Quantity, Side,
    UpdateAction,
};

/// Maximum price levels kept per side.
pub const MAX_DEPTH: usize = 10_000;

/// The data guarded by the version counter.
struct BookSides {
    /// Ascending by price; best bid at the back.
    bids: Vec<PriceLevel>,
    /// Descending by price; best ask at the back.
    asks: Vec<PriceLevel>,
    last_update_time: Option<Instant>,
}

/// Order book for a single symbol.
pub struct OrderBook {
    symbol: String,
    inner: UnsafeCell<BookSides>,
    /// Odd while an apply is in flight, even otherwise.
    version: AtomicU64,
    is_synchronized: AtomicBool,
    total_updates_processed: AtomicU64,
}

// Single-writer contract: apply methods must only be called from one
// thread at a time. Reads are safe from any thread via the version check.
unsafe impl Send for OrderBook {}
unsafe impl Sync for OrderBook {}

impl OrderBook {
    /// Create an empty, unsynchronized book.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            inner: UnsafeCell::new(BookSides {
                bids: Vec::with_capacity(MAX_DEPTH),
                asks: Vec::with_capacity(MAX_DEPTH),
                last_update_time: None,
            }),
            version: AtomicU64::new(0),
            is_synchronized: AtomicBool::new(false),
            total_updates_processed: AtomicU64::new(0),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Replace the whole book from a full refresh.
    ///
    /// The exchange-provided level order is not trusted; both sides are
    /// sorted into canonical order (best at the back).
    pub fn initialize_from_snapshot(&self, snapshot: &MarketDataSnapshot) {
        self.write(|sides| {
            sides.bids.clear();
            sides
                .bids
                .extend(snapshot.bids.iter().copied().take(MAX_DEPTH));
            sides.bids.sort_unstable_by(|a, b| a.price.cmp(&b.price));

            sides.asks.clear();
            sides
                .asks
                .extend(snapshot.asks.iter().copied().take(MAX_DEPTH));
            sides.asks.sort_unstable_by(|a, b| b.price.cmp(&a.price));

            sides.last_update_time = Some(Instant::now());
        });
        self.is_synchronized.store(true, Ordering::Release);
        self.total_updates_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Apply one incremental update.
    ///
    /// A `market_depth` of 1 targets the best quote on the entry's side;
    /// anything else matches each entry into the book by price.
    pub fn update_from_increment(&self, update: &MarketDataIncrement) {
        self.write(|sides| {
            for entry in &update.entries {
                let is_bid = match entry.side {
                    Side::Bid => true,
                    Side::Offer => false,
                    Side::Trade => continue,
                };
                let levels = if is_bid {
                    &mut sides.bids
                } else {
                    &mut sides.asks
                };
                if update.market_depth == 1 {
                    apply_top_of_book(levels, entry);
                } else {
                    apply_at_price(levels, entry, is_bid);
                }
            }
            sides.last_update_time = Some(Instant::now());
        });
        self.is_synchronized.store(true, Ordering::Release);
        self.total_updates_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Best bid, if any.
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.read(|sides| sides.bids.last().copied())
    }

    /// Best ask, if any.
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.read(|sides| sides.asks.last().copied())
    }

    /// Up to `depth` bid levels, best first.
    pub fn bids(&self, depth: usize) -> Vec<PriceLevel> {
        self.read(|sides| sides.bids.iter().rev().take(depth).copied().collect())
    }

    /// Up to `depth` ask levels, best first.
    pub fn asks(&self, depth: usize) -> Vec<PriceLevel> {
        self.read(|sides| sides.asks.iter().rev().take(depth).copied().collect())
    }

    /// Quantity resting at `price` on the bid side, zero if absent.
    pub fn bid_quantity_at(&self, price: Price) -> Quantity {
        self.read(|sides| quantity_at(&sides.bids, price, true))
    }

    /// Quantity resting at `price` on the ask side, zero if absent.
    pub fn ask_quantity_at(&self, price: Price) -> Quantity {
        self.read(|sides| quantity_at(&sides.asks, price, false))
    }

    pub fn total_bid_levels(&self) -> usize {
        self.read(|sides| sides.bids.len())
    }

    pub fn total_ask_levels(&self) -> usize {
        self.read(|sides| sides.asks.len())
    }

    /// True once the book has applied its first update.
    pub fn is_synchronized(&self) -> bool {
        self.is_synchronized.load(Ordering::Acquire)
    }

    pub fn last_update_time(&self) -> Option<Instant> {
        self.read(|sides| sides.last_update_time)
    }

    pub fn total_updates_processed(&self) -> u64 {
        self.total_updates_processed.load(Ordering::Relaxed)
    }

    /// Current value of the version counter (even between applies).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Derived metrics, computed under a single consistent read.
    pub fn metrics(&self) -> OrderBookMetrics {
        self.read(|sides| {
            let best_bid = sides.bids.last();
            let best_ask = sides.asks.last();
            let mid_price = match (best_bid, best_ask) {
                (Some(b), Some(a)) => Some((b.price + a.price) / Decimal::from(2)),
                _ => None,
            };
            let spread = match (best_bid, best_ask) {
                (Some(b), Some(a)) => Some(a.price - b.price),
                _ => None,
            };
            OrderBookMetrics {
                mid_price,
                spread,
                bid_depth: sides.bids.iter().map(|l| l.quantity).sum(),
                ask_depth: sides.asks.iter().map(|l| l.quantity).sum(),
                bid_levels: sides.bids.len(),
                ask_levels: sides.asks.len(),
            }
        })
    }

    fn write<T>(&self, f: impl FnOnce(&mut BookSides) -> T) -> T {
        self.version.fetch_add(1, Ordering::AcqRel);
        let result = f(unsafe { &mut *self.inner.get() });
        self.version.fetch_add(1, Ordering::Release);
        result
    }

    fn read<T>(&self, f: impl Fn(&BookSides) -> T) -> T {
        loop {
            let before = self.version.load(Ordering::Acquire);
            if before & 1 == 0 {
                let result = f(unsafe { &*self.inner.get() });
                if self.version.load(Ordering::Acquire) == before {
                    return result;
                }
            }
            std::hint::spin_loop();
        }
    }
}

/// Single-entry (top-of-book) apply: the entry targets the best quote.
fn apply_top_of_book(levels: &mut Vec<PriceLevel>, entry: &MarketDataEntry) {
    match entry.action {
        UpdateAction::New => match levels.last_mut() {
            Some(best) if best.price == entry.level.price => {
                best.quantity += entry.level.quantity;
            }
            _ => {
                if levels.len() < MAX_DEPTH {
                    levels.push(entry.level);
                }
            }
        },
        UpdateAction::Delete => {
            if let Some(best) = levels.last_mut() {
                best.quantity -= entry.level.quantity;
                if best.quantity <= Decimal::ZERO {
                    levels.pop();
                }
            }
        }
        UpdateAction::Change => {
            if entry.level.quantity == Decimal::ZERO {
                levels.pop();
            } else if let Some(best) = levels.last_mut() {
                *best = entry.level;
            }
        }
    }
}

/// Batch apply: match the entry into the side by price.
///
/// CHANGE and DELETE on an absent price are no-ops.
fn apply_at_price(levels: &mut Vec<PriceLevel>, entry: &MarketDataEntry, is_bid: bool) {
    let idx = insertion_point(levels, entry.level.price, is_bid);
    let matched = idx < levels.len() && levels[idx].price == entry.level.price;

    match entry.action {
        UpdateAction::New => {
            if matched {
                levels[idx].quantity += entry.level.quantity;
            } else if levels.len() < MAX_DEPTH {
                levels.insert(idx, entry.level);
            }
        }
        UpdateAction::Delete => {
            if matched {
                levels[idx].quantity -= entry.level.quantity;
                if levels[idx].quantity <= Decimal::ZERO {
                    levels.remove(idx);
                }
            }
        }
        UpdateAction::Change => {
            if matched {
                if entry.level.quantity == Decimal::ZERO {
                    levels.remove(idx);
                } else {
                    levels[idx].quantity = entry.level.quantity;
                }
            }
        }
    }
}

/// Index of the first level whose price is not before `price` in the
/// side's sort order (ascending bids, descending asks).
fn insertion_point(levels: &[PriceLevel], price: Price, is_bid: bool) -> usize {
    if is_bid {
        levels.partition_point(|l| l.price < price)
    } else {
        levels.partition_point(|l| l.price > price)
    }
}

fn quantity_at(levels: &[PriceLevel], price: Price, is_bid: bool) -> Quantity {
    let idx = insertion_point(levels, price, is_bid);
    if idx < levels.len() && levels[idx].price == price {
        levels[idx].quantity
    } else {
        Decimal::ZERO
    }
}
