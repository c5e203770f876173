//! FIX Market Data Handler
//!
//! Feed handler binary: connects the FIX session, subscribes the
//! configured symbols, and keeps per-symbol order books live while
//! periodically logging their state.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, trace, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fix_market_data::{Config, FixMarketDataEngine, OrderBookManager, SubscriptionRequest};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting FIX Market Data Handler");

    // Load configuration
    let config = Config::load()?;
    info!(symbols = ?config.symbols, "Configuration loaded");

    // One book per traded symbol
    let manager = Arc::new(OrderBookManager::new());
    for symbol in &config.symbols {
        manager.add_symbol(symbol);
    }

    let engine = FixMarketDataEngine::new(config.clone())?;

    // Wire decoded records into the book manager
    let snapshot_books = manager.clone();
    engine.register_snapshot_callback(move |snapshot| snapshot_books.process_snapshot(snapshot));
    let increment_books = manager.clone();
    engine.register_increment_callback(move |update| increment_books.process_increment(update));
    engine.register_trade_callback(|trade| {
        trace!(
            price = %trade.level.price,
            qty = %trade.level.quantity,
            "Trade received"
        );
    });

    engine.start()?;

    for symbol in &config.symbols {
        let mut req = SubscriptionRequest::full_book(symbol, config.market_depth);
        engine.sub_to_symbol(&mut req)?;
    }

    // Status loop; the session and workers run on their own threads.
    loop {
        std::thread::sleep(Duration::from_secs(config.status_interval_secs));
        for symbol in manager.get_symbols() {
            if let Some(book) = manager.get_book_by_symbol(&symbol) {
                let metrics = book.metrics();
                if let Some(mid) = metrics.mid_price {
                    info!(
                        symbol = %symbol,
                        mid_price = %mid,
                        spread = ?metrics.spread,
                        bid_levels = metrics.bid_levels,
                        ask_levels = metrics.ask_levels,
                        updates = book.total_updates_processed(),
                        logged_on = engine.is_logged(),
                        "Order book status"
                    );
                }
            }
        }
        let dropped = engine.dropped_messages();
        if dropped > 0 {
            info!(
                dropped,
                avg_decode_us = engine.parser().average_processing_time_us(),
                "Ingress statistics"
            );
        }
    }
}
