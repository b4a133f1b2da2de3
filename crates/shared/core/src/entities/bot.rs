use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::entities::{BotSettings, BotStats, LogEntry, Phase, Position, PricePoint};
use crate::values::{BotId, Price, Symbol, Timestamp};

/// Trading strategy a bot runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Scalping,
    Grid,
    Dca,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Scalping => "scalping",
            StrategyKind::Grid => "grid",
            StrategyKind::Dca => "dca",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full record of one trading bot
///
/// This is also the persisted snapshot: everything needed to resume the bot
/// after a restart is serialized, including any open position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    pub symbol: Symbol,
    pub strategy: StrategyKind,
    pub is_running: bool,
    pub settings: BotSettings,
    /// Open position; `None` means the bot is idle
    pub position: Option<Position>,
    pub stats: BotStats,
    /// Oldest first
    pub price_history: VecDeque<PricePoint>,
    /// Newest first
    pub logs: VecDeque<LogEntry>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub last_saved: Option<Timestamp>,
}

impl Bot {
    pub fn new(
        id: BotId,
        symbol: impl Into<Symbol>,
        strategy: StrategyKind,
        settings: BotSettings,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            strategy,
            is_running: false,
            settings,
            position: None,
            stats: BotStats::default(),
            price_history: VecDeque::new(),
            logs: VecDeque::new(),
            created_at: now,
            last_saved: None,
        }
    }

    /// Current phase, derived from the open position
    pub fn phase(&self) -> Phase {
        self.position
            .as_ref()
            .map(|p| p.phase)
            .unwrap_or(Phase::Idle)
    }

    /// Append a price point, keeping at most `limit` entries
    pub fn record_price(&mut self, point: PricePoint, limit: usize) {
        self.price_history.push_back(point);
        while self.price_history.len() > limit {
            self.price_history.pop_front();
        }
    }

    /// Most recent recorded price
    pub fn last_price(&self) -> Option<Price> {
        self.price_history.back().map(|p| p.price)
    }

    /// Price recorded just before the latest one
    pub fn previous_price(&self) -> Option<Price> {
        let len = self.price_history.len();
        if len < 2 {
            return None;
        }
        self.price_history.get(len - 2).map(|p| p.price)
    }

    /// Prepend a log entry, dropping the oldest beyond `limit`
    pub fn push_log(&mut self, entry: LogEntry, limit: usize) {
        self.logs.push_front(entry);
        self.logs.truncate(limit);
    }

    /// Repair a snapshot whose position claims to be idle
    ///
    /// Returns true if the record was changed.
    pub fn normalize(&mut self) -> bool {
        if matches!(&self.position, Some(p) if p.phase == Phase::Idle) {
            self.position = None;
            return true;
        }
        false
    }
}
