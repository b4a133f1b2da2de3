use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Traded pair identifier, e.g. `BTCUSDT`
pub type Symbol = String;

/// Ticks kept per bot for delta computation
pub const PRICE_HISTORY_LIMIT: usize = 100;

/// Event log entries kept per bot
pub const LOG_LIMIT: usize = 100;

/// Opaque bot identifier, assigned once at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(String);

impl BotId {
    /// Generate a fresh id of the form `bot_<SYMBOL>_<suffix>`
    pub fn generate(symbol: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("bot_{}_{}", symbol, &suffix[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BotId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for BotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
