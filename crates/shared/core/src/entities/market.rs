use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Symbol, Timestamp};

/// One price update for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: Symbol,
    pub price: Price,
    pub timestamp: Timestamp,
    /// 24h change in percent, when the feed provides it
    #[serde(default)]
    pub percent_change_24h: Option<Decimal>,
}

impl Tick {
    pub fn new(symbol: impl Into<Symbol>, price: Price, timestamp: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            percent_change_24h: None,
        }
    }

    pub fn with_change_24h(mut self, percent: Decimal) -> Self {
        self.percent_change_24h = Some(percent);
        self
    }
}

/// Entry of a bot's price history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Price,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change_24h: Option<Decimal>,
}

impl From<&Tick> for PricePoint {
    fn from(tick: &Tick) -> Self {
        Self {
            price: tick.price,
            timestamp: tick.timestamp,
            percent_change_24h: tick.percent_change_24h,
        }
    }
}
