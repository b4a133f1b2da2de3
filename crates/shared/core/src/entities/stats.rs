use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// Accumulated trading statistics for one bot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStats {
    /// Closed round trips
    pub total_trades: u64,
    /// Closed round trips with non-negative profit
    pub successful_trades: u64,
    /// Sum of realized profit in quote currency
    pub total_profit_quote: Decimal,
    /// First time the bot was started
    pub start_time: Option<Timestamp>,
}

impl BotStats {
    /// Account for a closed position
    pub fn record_close(&mut self, profit_quote: Decimal) {
        self.total_trades += 1;
        if profit_quote >= Decimal::ZERO {
            self.successful_trades += 1;
        }
        self.total_profit_quote += profit_quote;
    }

    /// Closed round trips that lost money
    pub fn losing_trades(&self) -> u64 {
        self.total_trades - self.successful_trades
    }
}
