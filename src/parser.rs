//! FIX market data decoder
//!
//! Dispatches an incoming message by type, decodes it into the neutral
//! records in [`crate::model`] and hands the result to the callback
//! registered for that record type. Runs on the symbol worker threads;
//! the only shared state is a pair of monotonic observability counters.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::{MarketDataError, Result};
use crate::model::{
    MarketDataEntry, MarketDataIncrement, MarketDataSnapshot, PriceLevel, Side, UpdateAction,
};
use crate::wire;

pub type SnapshotCallback = Box<dyn Fn(&MarketDataSnapshot) + Send + Sync>;
pub type IncrementCallback = Box<dyn Fn(&MarketDataIncrement) + Send + Sync>;
pub type TradeCallback = Box<dyn Fn(&MarketDataEntry) + Send + Sync>;

/// Type-dispatched decoder with per-record-type callbacks.
///
/// Registering a callback for a type replaces the previous one.
pub struct FixMarketDataParser {
    snapshot_callback: RwLock<Option<SnapshotCallback>>,
    increment_callback: RwLock<Option<IncrementCallback>>,
    trade_callback: RwLock<Option<TradeCallback>>,

    messages_processed: AtomicU64,
    processing_time_us: AtomicU64,
}

impl Default for FixMarketDataParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FixMarketDataParser {
    pub fn new() -> Self {
        Self {
            snapshot_callback: RwLock::new(None),
            increment_callback: RwLock::new(None),
            trade_callback: RwLock::new(None),
            messages_processed: AtomicU64::new(0),
            processing_time_us: AtomicU64::new(0),
        }
    }

    /// Register the full-refresh callback.
    pub fn on_snapshot<F>(&self, callback: F)
    where
        F: Fn(&MarketDataSnapshot) + Send + Sync + 'static,
    {
        *self.snapshot_callback.write() = Some(Box::new(callback));
    }

    /// Register the incremental-refresh callback.
    pub fn on_increment<F>(&self, callback: F)
    where
        F: Fn(&MarketDataIncrement) + Send + Sync + 'static,
    {
        *self.increment_callback.write() = Some(Box::new(callback));
    }

    /// Register the raw-trade callback.
    pub fn on_trade<F>(&self, callback: F)
    where
        F: Fn(&MarketDataEntry) + Send + Sync + 'static,
    {
        *self.trade_callback.write() = Some(Box::new(callback));
    }

    /// Decode one message and invoke the matching callback.
    ///
    /// `raw` is the tag=value text of a message the session library has
    /// already validated; `recv_time` is the network-thread receive
    /// timestamp and anchors the processing-latency counter.
    pub fn parse_message(&self, raw: &str, recv_time: Instant) {
        let result = match wire::field(raw, wire::MSG_TYPE) {
            Some(wire::MSG_TYPE_SNAPSHOT) => self.parse_snapshot(raw, recv_time).map(|snapshot| {
                if let Some(cb) = self.snapshot_callback.read().as_ref() {
                    cb(&snapshot);
                }
            }),
            Some(wire::MSG_TYPE_INCREMENTAL) => {
                self.parse_increment(raw, recv_time).map(|increment| {
                    if let Some(cb) = self.increment_callback.read().as_ref() {
                        cb(&increment);
                    }
                })
            }
            _ => self.parse_raw_trade(raw).map(|trade| {
                if let Some(cb) = self.trade_callback.read().as_ref() {
                    cb(&trade);
                }
            }),
        };

        match result {
            Ok(()) => {
                self.messages_processed.fetch_add(1, Ordering::Relaxed);
                self.processing_time_us
                    .fetch_add(recv_time.elapsed().as_micros() as u64, Ordering::Relaxed);
            }
            Err(e) => warn!(error = %e, "failed to decode market data message"),
        }
    }

    /// Messages fully decoded so far.
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Mean receive-to-decoded latency in microseconds.
    pub fn average_processing_time_us(&self) -> f64 {
        let processed = self.messages_processed.load(Ordering::Relaxed);
        if processed == 0 {
            return 0.0;
        }
        self.processing_time_us.load(Ordering::Relaxed) as f64 / processed as f64
    }

    fn parse_snapshot(&self, raw: &str, recv_time: Instant) -> Result<MarketDataSnapshot> {
        let symbol = wire::field(raw, wire::SYMBOL)
            .ok_or_else(|| MarketDataError::Decode("snapshot without Symbol".into()))?
            .to_string();

        let mut bids = Vec::new();
        let mut asks = Vec::new();
        for entry in EntryGroups::new(raw) {
            // Exchange-provided order is preserved; unknown entry types
            // are skipped.
            match entry.entry_type {
                '0' => bids.push(entry.level()?),
                '1' => asks.push(entry.level()?),
                _ => continue,
            }
        }

        Ok(MarketDataSnapshot {
            symbol,
            bids,
            asks,
            recv_time,
        })
    }

    fn parse_increment(&self, raw: &str, recv_time: Instant) -> Result<MarketDataIncrement> {
        let symbol = wire::field(raw, wire::SYMBOL)
            .ok_or_else(|| MarketDataError::Decode("increment without Symbol".into()))?
            .to_string();
        let action = wire::char_field(raw, wire::MD_UPDATE_ACTION)
            .and_then(UpdateAction::from_wire)
            .ok_or_else(|| MarketDataError::Decode("increment without MDUpdateAction".into()))?;

        let mut entries = Vec::new();
        for entry in EntryGroups::new(raw) {
            let side = match Side::from_wire(entry.entry_type) {
                Some(side @ (Side::Bid | Side::Offer)) => side,
                _ => continue,
            };
            entries.push(MarketDataEntry {
                side,
                level: entry.level()?,
                action,
            });
        }

        let market_depth = wire::field(raw, wire::NO_MD_ENTRIES)
            .and_then(|v| v.parse().ok())
            .unwrap_or(entries.len() as u32);

        Ok(MarketDataIncrement {
            symbol,
            entries,
            market_depth,
            recv_time,
        })
    }

    fn parse_raw_trade(&self, raw: &str) -> Result<MarketDataEntry> {
        let price = wire::field(raw, wire::MD_ENTRY_PX)
            .and_then(|v| Decimal::from_str(v).ok())
            .ok_or_else(|| MarketDataError::Decode("trade without MDEntryPx".into()))?;
        let quantity = wire::field(raw, wire::MD_ENTRY_SIZE)
            .and_then(|v| Decimal::from_str(v).ok())
            .ok_or_else(|| MarketDataError::Decode("trade without MDEntrySize".into()))?;

        Ok(MarketDataEntry {
            side: Side::Trade,
            level: PriceLevel::new(price, quantity),
            action: UpdateAction::New,
        })
    }
}

/// One repeating group of an MDEntries block.
struct RawEntry<'a> {
    entry_type: char,
    price: Option<&'a str>,
    size: Option<&'a str>,
}

impl RawEntry<'_> {
    fn level(&self) -> Result<PriceLevel> {
        let price = self
            .price
            .and_then(|v| Decimal::from_str(v).ok())
            .ok_or_else(|| MarketDataError::Decode("entry without MDEntryPx".into()))?;
        let quantity = self
            .size
            .and_then(|v| Decimal::from_str(v).ok())
            .ok_or_else(|| MarketDataError::Decode("entry without MDEntrySize".into()))?;
        Ok(PriceLevel::new(price, quantity))
    }
}

/// Iterator over the MDEntries repeating groups in wire order.
///
/// Each group opens at MDEntryType (269); MDEntryPx/MDEntrySize belong to
/// the most recently opened group.
struct EntryGroups<'a> {
    fields: std::vec::IntoIter<(u32, &'a str)>,
    pending: Option<RawEntry<'a>>,
}

impl<'a> EntryGroups<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            fields: wire::fields(raw).collect::<Vec<_>>().into_iter(),
            pending: None,
        }
    }
}

impl<'a> Iterator for EntryGroups<'a> {
    type Item = RawEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (tag, value) in self.fields.by_ref() {
            match tag {
                wire::MD_ENTRY_TYPE => {
                    let opened = RawEntry {
                        entry_type: value.chars().next().unwrap_or('\0'),
                        price: None,
                        size: None,
                    };
                    if let Some(done) = self.pending.replace(opened) {
                        return Some(done);
                    }
                }
                wire::MD_ENTRY_PX => {
                    if let Some(entry) = self.pending.as_mut() {
                        entry.price = Some(value);
                    }
                }
                wire::MD_ENTRY_SIZE => {
                    if let Some(entry) = self.pending.as_mut() {
                        entry.size = Some(value);
                    }
                }
                _ => {}
            }
        }
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn soh_join(fields: &[&str]) -> String {
        let mut raw = String::new();
        for f in fields {
            raw.push_str(f);
            raw.push('\u{1}');
        }
        raw
    }

    #[test]
    fn test_parse_snapshot() {
        let parser = FixMarketDataParser::new();
        let captured = Arc::new(Mutex::new(None));
        let slot = captured.clone();
        parser.on_snapshot(move |s| *slot.lock() = Some(s.clone()));

        let raw = soh_join(&[
            "8=FIX.4.4",
            "35=W",
            "55=BTCUSDT",
            "268=4",
            "269=0",
            "270=50000.5",
            "271=1.0",
            "269=1",
            "270=51000.5",
            "271=2.0",
            "269=0",
            "270=47005.6",
            "271=1.4",
            "269=J",
            "270=1",
            "271=1",
        ]);
        parser.parse_message(&raw, Instant::now());

        let snapshot = captured.lock().take().expect("snapshot callback fired");
        assert_eq!(snapshot.symbol, "BTCUSDT");
        // Wire order preserved; the unknown 'J' entry is skipped.
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.bids[0].price, dec!(50000.5));
        assert_eq!(snapshot.bids[1].price, dec!(47005.6));
        assert_eq!(snapshot.asks.len(), 1);
        assert_eq!(snapshot.asks[0].quantity, dec!(2.0));
    }

    #[test]
    fn test_parse_increment_shares_one_action() {
        let parser = FixMarketDataParser::new();
        let captured = Arc::new(Mutex::new(None));
        let slot = captured.clone();
        parser.on_increment(move |u| *slot.lock() = Some(u.clone()));

        let raw = soh_join(&[
            "8=FIX.4.4",
            "35=X",
            "55=ETHUSDT",
            "279=2",
            "268=2",
            "269=0",
            "270=3000.1",
            "271=0.5",
            "269=1",
            "270=3000.9",
            "271=0.7",
        ]);
        parser.parse_message(&raw, Instant::now());

        let update = captured.lock().take().expect("increment callback fired");
        assert_eq!(update.symbol, "ETHUSDT");
        assert_eq!(update.market_depth, 2);
        assert_eq!(update.entries.len(), 2);
        assert!(update
            .entries
            .iter()
            .all(|e| e.action == UpdateAction::Delete));
        assert_eq!(update.entries[0].side, Side::Bid);
        assert_eq!(update.entries[1].side, Side::Offer);
    }

    #[test]
    fn test_parse_trade_fallback() {
        let parser = FixMarketDataParser::new();
        let captured = Arc::new(Mutex::new(None));
        let slot = captured.clone();
        parser.on_trade(move |t| *slot.lock() = Some(*t));

        let raw = soh_join(&["8=FIX.4.4", "35=y", "55=BTCUSDT", "270=50000.5", "271=0.25"]);
        parser.parse_message(&raw, Instant::now());

        let trade = captured.lock().take().expect("trade callback fired");
        assert_eq!(trade.side, Side::Trade);
        assert_eq!(trade.level.price, dec!(50000.5));
        assert_eq!(trade.level.quantity, dec!(0.25));
    }

    #[test]
    fn test_counters_advance_per_message() {
        let parser = FixMarketDataParser::new();
        assert_eq!(parser.messages_processed(), 0);
        assert_eq!(parser.average_processing_time_us(), 0.0);

        let raw = soh_join(&["35=W", "55=BTCUSDT", "268=0"]);
        parser.parse_message(&raw, Instant::now());
        parser.parse_message(&raw, Instant::now());
        assert_eq!(parser.messages_processed(), 2);
    }

    #[test]
    fn test_malformed_message_does_not_count() {
        let parser = FixMarketDataParser::new();
        // Snapshot without a Symbol field.
        let raw = soh_join(&["35=W", "268=0"]);
        parser.parse_message(&raw, Instant::now());
        assert_eq!(parser.messages_processed(), 0);
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let parser = FixMarketDataParser::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let first = hits.clone();
        parser.on_trade(move |_| first.lock().push("first"));
        let second = hits.clone();
        parser.on_trade(move |_| second.lock().push("second"));

        let raw = soh_join(&["35=y", "270=1", "271=1"]);
        parser.parse_message(&raw, Instant::now());
        assert_eq!(*hits.lock(), vec!["second"]);
    }
}
