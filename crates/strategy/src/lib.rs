//! Scalper Strategy Framework
//!
//! Strategies turn a stream of prices into trade intents:
//! - `TickStrategy` trait evaluated once per tick
//! - `ScalpingStrategy`: the risk-managed position state machine
//! - Grid and DCA placeholders that report themselves as not implemented
//!
//! ## Position lifecycle
//!
//! ```text
//!                 delta <= buy threshold
//!   ┌──────┐ ─────────────────────────────► ┌────────────────────┐
//!   │ IDLE │                                │ WAITING_FOR_PROFIT │
//!   └──────┘ ◄──── stop-loss / take-profit ─└─────────┬──────────┘
//!      ▲                                              │ profit >= breakeven trigger
//!      │                                              ▼
//!      │  breakeven stop / stop-loss            ┌───────────┐
//!      ├─────────────────────────────────────── │ BREAKEVEN │
//!      │                                        └─────┬─────┘
//!      │                                              │ profit >= trailing activation
//!      │  trailing stop / stop-loss             ┌─────▼────┐
//!      └─────────────────────────────────────── │ TRAILING │
//!                                               └──────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scalper_strategy::{PriceStep, StrategyContext, for_kind};
//!
//! let strategy = for_kind(bot.strategy);
//! let mut ctx = StrategyContext::new(&bot.settings, &mut bot.position, &mut bot.stats);
//! let evaluation = strategy.on_tick(&step, &mut ctx)?;
//! ```

pub mod error;
pub mod scalping;
pub mod strategy;
pub mod stubs;

// Re-export main types
pub use error::{Result, StrategyError};
pub use scalping::ScalpingStrategy;
pub use strategy::{Evaluation, PriceStep, StrategyContext, TickStrategy, Transition, for_kind};
pub use stubs::{DcaStrategy, GridStrategy};
