//! Scalper Runner - paper-trading host for the bot engine
//!
//! Hosts the registry in a long-running process:
//!
//! - **Config**: one JSON document, CLI argument or `SCALPER_CONFIG`
//! - **Bootstrap**: store, ledger, gateway and feed wiring; restore on start-up
//! - **Event Feed**: random-walk price source driving the bots
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────────────┐
//!   │ SimulatedPriceFeed │──── mark price ────────────┐
//!   └─────────┬──────────┘                            │
//!             │ ticks                                 ▼
//!   ┌─────────▼──────────┐                 ┌────────────────────┐
//!   │  ChannelPriceFeed  │                 │ PaperOrderGateway  │
//!   └─────────┬──────────┘                 └─────────▲──────────┘
//!             │ per-symbol subscriptions             │ market orders
//!   ┌─────────▼──────────────────────────────────────┴──────────┐
//!   │                        BotRegistry                        │
//!   │   bot tasks  ──►  strategy  ──►  event log / ledger       │
//!   └─────────────────────────┬─────────────────────────────────┘
//!                             │ snapshots
//!                   ┌─────────▼──────────┐
//!                   │ JsonFileStateStore │
//!                   └────────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod event_feed;

// Re-export main types
pub use bootstrap::App;
pub use config::{AppConfig, BotSpec};
pub use error::{ConfigError, Result, RunnerError};
pub use event_feed::{SimulatedFeedConfig, SimulatedPriceFeed};
