//! Configuration module for the market data handler

use serde::Deserialize;
use std::env;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Trading symbols to subscribe to (e.g., ["BTCUSDT", "ETHUSDT"])
    pub symbols: Vec<String>,

    /// Path to the FIX session settings file (initiator section included)
    pub fix_config_path: String,

    /// Path to the PKCS#8 PEM file holding the Ed25519 private key
    pub private_key_path: String,

    /// API key sent as Username on the signed Logon
    pub api_key: String,

    /// SenderCompID of the session, as configured in the settings file
    pub sender_comp_id: String,

    /// TargetCompID of the session
    pub target_comp_id: String,

    /// Depth requested on full-book subscriptions
    pub market_depth: u32,

    /// First CPU core for symbol workers; worker i is pinned to base + i
    pub worker_base_core: usize,

    /// Capacity of each per-symbol ingress ring
    pub ring_capacity: usize,

    /// Seconds to wait for the initiator to come up in start()
    pub start_timeout_secs: u64,

    /// Book status logging interval in seconds
    pub status_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let symbols: Vec<String> = env::var("SYMBOLS")
            .unwrap_or_else(|_| "BTCUSDT,ETHUSDT".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .collect();

        Ok(Self {
            symbols,
            fix_config_path: env::var("FIX_CONFIG_PATH")
                .unwrap_or_else(|_| "config/fix_session.cfg".to_string()),
            private_key_path: env::var("FIX_PRIVATE_KEY_PATH")
                .unwrap_or_else(|_| "config/ed25519_private_key.pem".to_string()),
            api_key: env::var("FIX_API_KEY").unwrap_or_default(),
            sender_comp_id: env::var("FIX_SENDER_COMP_ID")
                .unwrap_or_else(|_| "MDCLIENT".to_string()),
            target_comp_id: env::var("FIX_TARGET_COMP_ID").unwrap_or_else(|_| "SPOT".to_string()),
            market_depth: env::var("MARKET_DEPTH")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            worker_base_core: env::var("WORKER_BASE_CORE")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            ring_capacity: env::var("RING_CAPACITY")
                .unwrap_or_else(|_| "16384".to_string())
                .parse()
                .unwrap_or(16384),
            start_timeout_secs: env::var("START_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            status_interval_secs: env::var("STATUS_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            fix_config_path: "config/fix_session.cfg".to_string(),
            private_key_path: "config/ed25519_private_key.pem".to_string(),
            api_key: String::new(),
            sender_comp_id: "MDCLIENT".to_string(),
            target_comp_id: "SPOT".to_string(),
            market_depth: 100,
            worker_base_core: 1,
            ring_capacity: 16384,
            start_timeout_secs: 10,
            status_interval_secs: 30,
        }
    }
}
