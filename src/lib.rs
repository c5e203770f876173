//! FIX 4.4 Market Data Handler Library
//!
//! This crate provides low-latency market data handling for exchanges
//! speaking FIX 4.4: an Ed25519-signed session, per-symbol subscription
//! management, and live order book reconstruction with lock-free reads.

pub mod config;
pub mod error;
pub mod model;
pub mod orderbook;
pub mod parser;
pub mod session;
pub mod signer;
pub mod spsc;
pub mod wire;

pub use config::Config;
pub use error::{MarketDataError, Result};
pub use model::{
    MarketDataEntry, MarketDataIncrement, MarketDataSnapshot, PriceLevel, Side, StreamType,
    SubscriptionRequest, UpdateAction,
};
pub use orderbook::{OrderBook, OrderBookManager, OrderBookMetrics};
pub use parser::FixMarketDataParser;
pub use session::FixMarketDataEngine;
pub use signer::Ed25519Signer;
pub use spsc::SpscRing;
