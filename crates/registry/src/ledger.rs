//! Trade Ledger
//!
//! Cross-bot record of every order attempt, bot start/stop events and errors,
//! newest first and bounded. Aggregate stats are kept alongside:
//! - `total_trades` counts every attempt
//! - `successful_trades` and `total_profit` only count filled orders
//! - `failed_trades` counts rejections
//!
//! The ledger is best effort. When a file path is configured the whole ledger
//! is rewritten after each change; write failures are logged and dropped.
//! Writes go through a temp file and are serialized, so the file on disk is
//! always a complete snapshot no older than the previous write.
//!
//! Record timestamps come from the caller, normally the registry's clock.

use rust_decimal::Decimal;
use scalper_core::{
    Bot, BotId, BotSettings, BotStats, ExitReason, Price, Quantity, Side, StrategyKind, Symbol,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Ledger bounds and location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub max_trades: usize,
    pub max_bot_events: usize,
    pub max_errors: usize,
    /// JSON file the ledger is kept in; memory only when unset
    pub path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_trades: 1000,
            max_bot_events: 500,
            max_errors: 100,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Success,
    Failed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Success => "success",
            TradeStatus::Failed => "failed",
        }
    }
}

/// One order attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub timestamp: Timestamp,
    pub bot_id: BotId,
    pub symbol: Symbol,
    pub side: Side,
    pub status: TradeStatus,
    pub price: Price,
    pub quantity: Quantity,
    /// Notional in quote currency
    pub amount: Decimal,
    #[serde(default)]
    pub profit: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<ExitReason>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub strategy: StrategyKind,
    pub settings: BotSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotEventKind {
    BotStart,
    BotStop,
}

/// Bot start or stop, with the settings and stats at that moment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotEventRecord {
    pub id: String,
    pub timestamp: Timestamp,
    pub kind: BotEventKind,
    pub bot_id: BotId,
    pub symbol: Symbol,
    pub strategy: StrategyKind,
    pub settings: BotSettings,
    pub stats: BotStats,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub bot_id: Option<BotId>,
    #[serde(default)]
    pub symbol: Option<Symbol>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_trades: u64,
    pub successful_trades: u64,
    pub failed_trades: u64,
    pub total_profit: Decimal,
}

/// Everything the ledger holds, as written to disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSnapshot {
    pub trades: VecDeque<TradeRecord>,
    pub bot_events: VecDeque<BotEventRecord>,
    pub errors: VecDeque<ErrorRecord>,
    pub stats: LedgerStats,
    pub last_update: Option<Timestamp>,
}

#[derive(Serialize)]
struct LedgerExport<'a> {
    export_date: Timestamp,
    #[serde(flatten)]
    ledger: &'a LedgerSnapshot,
}

/// Attempted order, as reported to [`TradeLedger::record_trade`]
#[derive(Debug, Clone)]
pub struct TradeAttempt {
    pub bot_id: BotId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub amount: Decimal,
    pub profit: Option<Decimal>,
    pub reason: Option<ExitReason>,
    pub strategy: StrategyKind,
    pub settings: BotSettings,
}

const CSV_HEADER: &str = "ID,Timestamp,Bot ID,Symbol,Type,Status,Price,Quantity,Amount,Profit,Error";

pub struct TradeLedger {
    config: LedgerConfig,
    state: Mutex<LedgerSnapshot>,
    /// Held for the whole of a file write
    write_lock: tokio::sync::Mutex<()>,
}

fn push_bounded<T>(list: &mut VecDeque<T>, item: T, limit: usize) {
    list.push_front(item);
    list.truncate(limit);
}

fn record_id(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

/// Quote a CSV field when it needs it
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl TradeLedger {
    /// Empty ledger; nothing is read from `config.path`
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LedgerSnapshot::default()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Ledger backed by `config.path`, loading what is already there
    pub async fn open(config: LedgerConfig) -> Self {
        let mut snapshot = LedgerSnapshot::default();

        if let Some(path) = &config.path {
            match tokio::fs::read(path).await {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(loaded) => snapshot = loaded,
                    Err(e) => log::warn!(
                        "[TradeLedger] Ignoring unreadable ledger {}: {}",
                        path.display(),
                        e
                    ),
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("[TradeLedger] Cannot read {}: {}", path.display(), e),
            }
        }

        Self {
            config,
            state: Mutex::new(snapshot),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerSnapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an order attempt; `outcome` is the exchange order id or the rejection
    pub fn record_trade(
        &self,
        now: Timestamp,
        attempt: TradeAttempt,
        outcome: Result<String, String>,
    ) -> TradeRecord {
        let (status, order_id, error) = match outcome {
            Ok(order_id) => (TradeStatus::Success, Some(order_id), None),
            Err(reason) => (TradeStatus::Failed, None, Some(reason)),
        };

        let record = TradeRecord {
            id: record_id("trade"),
            timestamp: now,
            bot_id: attempt.bot_id,
            symbol: attempt.symbol,
            side: attempt.side,
            status,
            price: attempt.price,
            quantity: attempt.quantity,
            amount: attempt.amount,
            profit: attempt.profit,
            reason: attempt.reason,
            order_id,
            error,
            strategy: attempt.strategy,
            settings: attempt.settings,
        };

        let mut state = self.lock();
        state.stats.total_trades += 1;
        match status {
            TradeStatus::Success => {
                state.stats.successful_trades += 1;
                state.stats.total_profit += record.profit.unwrap_or(Decimal::ZERO);
            }
            TradeStatus::Failed => state.stats.failed_trades += 1,
        }
        push_bounded(&mut state.trades, record.clone(), self.config.max_trades);
        state.last_update = Some(now);

        record
    }

    /// Record a bot start or stop
    pub fn record_bot_event(
        &self,
        now: Timestamp,
        kind: BotEventKind,
        bot: &Bot,
    ) -> BotEventRecord {
        let message = match kind {
            BotEventKind::BotStart => format!(
                "Bot started: {} - {}",
                bot.symbol,
                bot.strategy.as_str().to_uppercase()
            ),
            BotEventKind::BotStop => format!(
                "Bot stopped: {} - {} trades",
                bot.symbol, bot.stats.total_trades
            ),
        };
        let prefix = match kind {
            BotEventKind::BotStart => "start",
            BotEventKind::BotStop => "stop",
        };

        let record = BotEventRecord {
            id: record_id(prefix),
            timestamp: now,
            kind,
            bot_id: bot.id.clone(),
            symbol: bot.symbol.clone(),
            strategy: bot.strategy,
            settings: bot.settings,
            stats: bot.stats.clone(),
            message,
        };

        let mut state = self.lock();
        push_bounded(&mut state.bot_events, record.clone(), self.config.max_bot_events);
        state.last_update = Some(now);
        record
    }

    /// Record an error not tied to a specific trade record
    pub fn record_error(
        &self,
        now: Timestamp,
        bot_id: Option<&BotId>,
        symbol: Option<&str>,
        message: impl Into<String>,
    ) -> ErrorRecord {
        let record = ErrorRecord {
            id: record_id("error"),
            timestamp: now,
            bot_id: bot_id.cloned(),
            symbol: symbol.map(str::to_string),
            message: message.into(),
        };

        let mut state = self.lock();
        push_bounded(&mut state.errors, record.clone(), self.config.max_errors);
        state.last_update = Some(now);
        record
    }

    pub fn stats(&self) -> LedgerStats {
        self.lock().stats.clone()
    }

    /// All trades, newest first
    pub fn trades(&self) -> Vec<TradeRecord> {
        self.lock().trades.iter().cloned().collect()
    }

    pub fn bot_trades(&self, bot_id: &BotId) -> Vec<TradeRecord> {
        self.lock()
            .trades
            .iter()
            .filter(|t| &t.bot_id == bot_id)
            .cloned()
            .collect()
    }

    pub fn symbol_trades(&self, symbol: &str) -> Vec<TradeRecord> {
        self.lock()
            .trades
            .iter()
            .filter(|t| t.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn bot_events(&self) -> Vec<BotEventRecord> {
        self.lock().bot_events.iter().cloned().collect()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.lock().errors.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().clone()
    }

    /// Pretty JSON of the whole ledger plus `export_date`
    pub fn export_json(&self, export_date: Timestamp) -> serde_json::Result<String> {
        let snapshot = self.snapshot();
        serde_json::to_string_pretty(&LedgerExport {
            export_date,
            ledger: &snapshot,
        })
    }

    /// Trades as CSV, newest first
    pub fn export_csv(&self) -> String {
        let state = self.lock();
        let mut lines = Vec::with_capacity(state.trades.len() + 1);
        lines.push(CSV_HEADER.to_string());

        for trade in &state.trades {
            let fields = [
                trade.id.clone(),
                trade.timestamp.to_rfc3339(),
                trade.bot_id.to_string(),
                trade.symbol.clone(),
                trade.side.to_string(),
                trade.status.as_str().to_string(),
                trade.price.to_string(),
                trade.quantity.to_string(),
                trade.amount.to_string(),
                trade.profit.unwrap_or(Decimal::ZERO).to_string(),
                trade.error.clone().unwrap_or_default(),
            ];
            let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
            lines.push(row.join(","));
        }

        lines.join("\n")
    }

    /// Drop every record and reset the stats
    pub fn clear(&self) {
        *self.lock() = LedgerSnapshot::default();
    }

    /// Write the ledger to its file, if it has one
    pub async fn persist(&self) {
        let Some(path) = &self.config.path else {
            return;
        };
        let _writing = self.write_lock.lock().await;

        // Taken under the write lock so a slower writer never lands older data
        let json = match serde_json::to_vec_pretty(&self.snapshot()) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("[TradeLedger] Serialization failed: {}", e);
                return;
            }
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("[TradeLedger] Cannot create {}: {}", parent.display(), e);
                return;
            }
        }

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&tmp, json).await {
            log::warn!("[TradeLedger] Cannot write {}: {}", tmp.display(), e);
            return;
        }
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            log::warn!("[TradeLedger] Cannot replace {}: {}", path.display(), e);
        }
    }
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn attempt(bot: &str, symbol: &str, side: Side, profit: Option<Decimal>) -> TradeAttempt {
        TradeAttempt {
            bot_id: BotId::from(bot),
            symbol: symbol.to_string(),
            side,
            price: dec!(100),
            quantity: dec!(0.1),
            amount: dec!(10),
            profit,
            reason: None,
            strategy: StrategyKind::Scalping,
            settings: BotSettings::default(),
        }
    }

    #[test]
    fn test_stats_only_count_profit_of_filled_trades() {
        let ledger = TradeLedger::default();

        ledger.record_trade(now(), attempt("a", "BTCUSDT", Side::Buy, None), Ok("1".into()));
        ledger.record_trade(
            now(),
            attempt("a", "BTCUSDT", Side::Sell, Some(dec!(0.5))),
            Ok("2".into()),
        );
        ledger.record_trade(
            now(),
            attempt("a", "BTCUSDT", Side::Sell, Some(dec!(0.7))),
            Err("Insufficient balance".into()),
        );

        let stats = ledger.stats();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.successful_trades, 2);
        assert_eq!(stats.failed_trades, 1);
        assert_eq!(stats.total_profit, dec!(0.5));
    }

    #[test]
    fn test_trades_newest_first_and_bounded() {
        let ledger = TradeLedger::new(LedgerConfig {
            max_trades: 3,
            ..Default::default()
        });
        for i in 0..5 {
            ledger.record_trade(
                now(),
                attempt("a", "BTCUSDT", Side::Buy, None),
                Ok(format!("order-{}", i)),
            );
        }

        let trades = ledger.trades();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].order_id.as_deref(), Some("order-4"));
        assert_eq!(trades[2].order_id.as_deref(), Some("order-2"));
        // Stats keep counting past the bound
        assert_eq!(ledger.stats().total_trades, 5);
    }

    #[test]
    fn test_queries_by_bot_and_symbol() {
        let ledger = TradeLedger::default();
        ledger.record_trade(now(), attempt("a", "BTCUSDT", Side::Buy, None), Ok("1".into()));
        ledger.record_trade(now(), attempt("b", "ETHUSDT", Side::Buy, None), Ok("2".into()));
        ledger.record_trade(now(), attempt("b", "BTCUSDT", Side::Buy, None), Ok("3".into()));

        assert_eq!(ledger.bot_trades(&BotId::from("b")).len(), 2);
        assert_eq!(ledger.symbol_trades("BTCUSDT").len(), 2);
        assert!(ledger.symbol_trades("SOLUSDT").is_empty());
    }

    #[test]
    fn test_bot_events_and_errors_are_bounded() {
        let ledger = TradeLedger::new(LedgerConfig {
            max_bot_events: 2,
            max_errors: 1,
            ..Default::default()
        });
        let bot = Bot::new(
            BotId::from("bot_BTCUSDT_x"),
            "BTCUSDT",
            StrategyKind::Scalping,
            BotSettings::default(),
            now(),
        );

        let start = ledger.record_bot_event(now(), BotEventKind::BotStart, &bot);
        assert_eq!(start.message, "Bot started: BTCUSDT - SCALPING");
        ledger.record_bot_event(now(), BotEventKind::BotStop, &bot);
        ledger.record_bot_event(now(), BotEventKind::BotStart, &bot);
        ledger.record_error(now(), Some(&bot.id), Some("BTCUSDT"), "first");
        ledger.record_error(now(), None, None, "second");

        let events = ledger.bot_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, BotEventKind::BotStop);
        assert_eq!(events[1].message, "Bot stopped: BTCUSDT - 0 trades");
        assert_eq!(ledger.errors().len(), 1);
        assert_eq!(ledger.errors()[0].message, "second");
    }

    #[test]
    fn test_csv_export() {
        let ledger = TradeLedger::default();
        ledger.record_trade(
            now(),
            attempt("bot_1", "BTCUSDT", Side::Sell, Some(dec!(0.25))),
            Err("Notional 2, below minimum".into()),
        );

        let csv = ledger.export_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(",bot_1,BTCUSDT,SELL,failed,100,0.1,10,0.25,"));
        assert!(lines[1].ends_with("\"Notional 2, below minimum\""));
    }

    #[test]
    fn test_json_export_and_clear() {
        let ledger = TradeLedger::default();
        ledger.record_trade(now(), attempt("a", "BTCUSDT", Side::Buy, None), Ok("1".into()));

        let json: serde_json::Value =
            serde_json::from_str(&ledger.export_json(now()).unwrap()).unwrap();
        assert_eq!(json["export_date"], "2024-05-01T12:00:00Z");
        assert_eq!(json["trades"][0]["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["trades"].as_array().unwrap().len(), 1);
        assert_eq!(json["stats"]["total_trades"], 1);

        ledger.clear();
        assert!(ledger.trades().is_empty());
        assert_eq!(ledger.stats(), LedgerStats::default());
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let path = std::env::temp_dir()
            .join(format!("scalper-ledger-{}", Uuid::new_v4()))
            .join("trades.json");
        let config = LedgerConfig {
            path: Some(path.clone()),
            ..Default::default()
        };

        let ledger = TradeLedger::open(config.clone()).await;
        ledger.record_trade(now(), attempt("a", "BTCUSDT", Side::Buy, None), Ok("1".into()));
        ledger.persist().await;

        let reopened = TradeLedger::open(config).await;
        assert_eq!(reopened.trades().len(), 1);
        assert_eq!(reopened.stats().total_trades, 1);

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn test_concurrent_persists_leave_a_complete_file() {
        let path = std::env::temp_dir()
            .join(format!("scalper-ledger-{}", Uuid::new_v4()))
            .join("trades.json");
        let config = LedgerConfig {
            path: Some(path.clone()),
            ..Default::default()
        };
        let ledger = Arc::new(TradeLedger::open(config.clone()).await);

        for round in 0..5 {
            let mut tasks = Vec::new();
            for task in 0..16 {
                let ledger = Arc::clone(&ledger);
                tasks.push(tokio::spawn(async move {
                    let bot = format!("bot_{}", task);
                    ledger.record_trade(
                        now(),
                        attempt(&bot, "BTCUSDT", Side::Buy, None),
                        Ok(format!("{}-{}", round, task)),
                    );
                    ledger.persist().await;
                }));
            }
            for task in tasks {
                task.await.unwrap();
            }

            let on_disk = TradeLedger::open(config.clone()).await;
            assert_eq!(on_disk.snapshot(), ledger.snapshot(), "round {}", round);
        }
        assert_eq!(ledger.stats().total_trades, 80);
        assert!(!path.with_extension("json.tmp").exists());

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}
