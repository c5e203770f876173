//! Order book manager
//!
//! Directory of per-symbol books. Symbol add/remove takes the write lock;
//! lookups and the snapshot/increment processors take the read lock and
//! delegate to the book, which handles its own reader/writer discipline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::OrderBook;
use crate::model::{MarketDataIncrement, MarketDataSnapshot};

/// Manages order books for multiple symbols
#[derive(Default)]
pub struct OrderBookManager {
    books: RwLock<HashMap<String, Arc<OrderBook>>>,
    total_updates_processed: AtomicU64,
}

impl OrderBookManager {
    /// Create a new order book manager
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            total_updates_processed: AtomicU64::new(0),
        }
    }

    /// Create an empty book for `symbol`, replacing any existing one.
    pub fn add_symbol(&self, symbol: &str) {
        let book = Arc::new(OrderBook::new(symbol));
        self.books.write().insert(symbol.to_string(), book);
    }

    /// Drop the book for `symbol`.
    ///
    /// Handles already returned by [`get_book_by_symbol`] stay valid for
    /// as long as the caller holds them.
    pub fn remove_symbol(&self, symbol: &str) {
        self.books.write().remove(symbol);
    }

    /// Route a full refresh to its book.
    pub fn process_snapshot(&self, snapshot: &MarketDataSnapshot) {
        match self.get_book_by_symbol(&snapshot.symbol) {
            Some(book) => {
                book.initialize_from_snapshot(snapshot);
                self.total_updates_processed.fetch_add(1, Ordering::Relaxed);
            }
            None => trace!(symbol = %snapshot.symbol, "snapshot for untracked symbol dropped"),
        }
    }

    /// Route an incremental update to its book.
    pub fn process_increment(&self, update: &MarketDataIncrement) {
        match self.get_book_by_symbol(&update.symbol) {
            Some(book) => {
                book.update_from_increment(update);
                self.total_updates_processed.fetch_add(1, Ordering::Relaxed);
            }
            None => trace!(symbol = %update.symbol, "increment for untracked symbol dropped"),
        }
    }

    /// Shared handle to the book for `symbol`, if tracked.
    pub fn get_book_by_symbol(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.books.read().get(symbol).cloned()
    }

    /// Symbols currently tracked.
    pub fn get_symbols(&self) -> Vec<String> {
        self.books.read().keys().cloned().collect()
    }

    /// Number of books currently tracked.
    pub fn get_total_books(&self) -> usize {
        self.books.read().len()
    }

    /// Updates routed through this manager across all books.
    pub fn get_total_updates_processed(&self) -> u64 {
        self.total_updates_processed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PriceLevel;
    use rust_decimal_macros::dec;
    use std::time::Instant;

    fn snapshot(symbol: &str) -> MarketDataSnapshot {
        MarketDataSnapshot {
            symbol: symbol.to_string(),
            bids: vec![PriceLevel::new(dec!(50000.5), dec!(1.0))],
            asks: vec![PriceLevel::new(dec!(50001.5), dec!(2.0))],
            recv_time: Instant::now(),
        }
    }

    #[test]
    fn test_add_and_remove_symbol() {
        let manager = OrderBookManager::new();
        manager.add_symbol("BTCUSDT");
        manager.add_symbol("ETHUSDT");

        assert_eq!(manager.get_total_books(), 2);
        let mut symbols = manager.get_symbols();
        symbols.sort();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);

        manager.remove_symbol("ETHUSDT");
        assert_eq!(manager.get_total_books(), 1);
        assert!(manager.get_book_by_symbol("ETHUSDT").is_none());
    }

    #[test]
    fn test_snapshot_routes_to_matching_book() {
        let manager = OrderBookManager::new();
        manager.add_symbol("BTCUSDT");
        manager.add_symbol("ETHUSDT");

        manager.process_snapshot(&snapshot("BTCUSDT"));

        let btc = manager.get_book_by_symbol("BTCUSDT").unwrap();
        let eth = manager.get_book_by_symbol("ETHUSDT").unwrap();
        assert!(btc.is_synchronized());
        assert!(!eth.is_synchronized());
        assert_eq!(manager.get_total_updates_processed(), 1);
    }

    #[test]
    fn test_untracked_symbol_is_dropped() {
        let manager = OrderBookManager::new();
        manager.process_snapshot(&snapshot("BTCUSDT"));
        assert_eq!(manager.get_total_updates_processed(), 0);
    }

    #[test]
    fn test_held_handle_survives_removal() {
        let manager = OrderBookManager::new();
        manager.add_symbol("BTCUSDT");
        manager.process_snapshot(&snapshot("BTCUSDT"));

        let handle = manager.get_book_by_symbol("BTCUSDT").unwrap();
        manager.remove_symbol("BTCUSDT");

        assert_eq!(
            handle.best_bid(),
            Some(PriceLevel::new(dec!(50000.5), dec!(1.0)))
        );
    }
}
