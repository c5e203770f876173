//! FIX session module
//!
//! Session lifecycle, signed logon, subscription management and the
//! ingress fan-out into per-symbol worker threads.

mod application;
mod engine;

pub use engine::FixMarketDataEngine;
