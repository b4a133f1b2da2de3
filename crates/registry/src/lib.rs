//! Scalper Bot Registry
//!
//! Owns the set of trading bots and drives them:
//! - Lifecycle: create, start, stop, delete, edit while stopped
//! - Tick processing: price history, strategy evaluation, order dispatch
//! - Per-bot event log and the cross-bot trade ledger
//! - Snapshots to the state store and restore after a restart
//! - A change feed for displays
//!
//! ## Tick flow
//!
//! ```text
//!  PriceFeed ──► bot runner task ──► handle_tick
//!                                      │ lock bot
//!                                      │ record price, evaluate strategy,
//!                                      │ log transitions (committed)
//!                                      │ unlock
//!                                      ├──► OrderGateway (if intent)
//!                                      │ lock bot
//!                                      │ log outcome, ledger, persist
//!                                      ▼
//!                               change feed (BotUpdate)
//! ```

pub mod config;
pub mod error;
pub mod event_log;
pub mod export;
pub mod ledger;
mod registry;
mod runner;
pub mod update;

// Re-export main types
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use export::{BotSummary, HistoryExport};
pub use ledger::{
    BotEventKind, BotEventRecord, ErrorRecord, LedgerConfig, LedgerSnapshot, LedgerStats,
    TradeAttempt, TradeLedger, TradeRecord, TradeStatus,
};
pub use registry::BotRegistry;
pub use update::{BotUpdate, UpdateKind};
