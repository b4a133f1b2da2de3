//! Scalper Core Domain
//!
//! Pure domain types for the Scalper bot engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Bot record
    Bot,
    BotStats,
    StrategyKind,
    // Settings
    BotSettings,
    SettingsInput,
    // Position lifecycle
    Phase,
    Position,
    // Trading
    ExitReason,
    Side,
    TradeIntent,
    // Market data
    PricePoint,
    Tick,
    // Event log
    LogEntry,
    LogKind,
};
pub use values::{BotId, LOG_LIMIT, PRICE_HISTORY_LIMIT, Price, Quantity, Symbol, Timestamp};
