//! History export

use scalper_core::{Bot, BotId, BotSettings, BotStats, LogEntry, PricePoint, StrategyKind, Symbol, Timestamp};
use serde::{Deserialize, Serialize};

/// Identity and configuration part of an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSummary {
    pub id: BotId,
    pub symbol: Symbol,
    pub strategy: StrategyKind,
    pub settings: BotSettings,
    pub created_at: Timestamp,
}

/// Everything recorded about one bot, for download or archiving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryExport {
    pub bot: BotSummary,
    pub stats: BotStats,
    /// Newest first
    pub logs: Vec<LogEntry>,
    /// Oldest first
    pub price_history: Vec<PricePoint>,
    pub exported_at: Timestamp,
}

impl HistoryExport {
    pub fn from_bot(bot: &Bot, exported_at: Timestamp) -> Self {
        Self {
            bot: BotSummary {
                id: bot.id.clone(),
                symbol: bot.symbol.clone(),
                strategy: bot.strategy,
                settings: bot.settings,
                created_at: bot.created_at,
            },
            stats: bot.stats.clone(),
            logs: bot.logs.iter().cloned().collect(),
            price_history: bot.price_history.iter().cloned().collect(),
            exported_at,
        }
    }
}
