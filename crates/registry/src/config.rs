//! Registry configuration

use scalper_core::{LOG_LIMIT, PRICE_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};

/// Bounds and cadences of the bot registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Ticks kept per bot
    pub price_history_limit: usize,
    /// Event log entries kept per bot
    pub log_limit: usize,
    /// Ticks between snapshots when nothing else changes
    pub persist_every_ticks: u32,
    /// Buffered change notifications per subscriber
    pub change_feed_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            price_history_limit: PRICE_HISTORY_LIMIT,
            log_limit: LOG_LIMIT,
            persist_every_ticks: 10,
            change_feed_capacity: 256,
        }
    }
}
