//! Strategy Trait
//!
//! Defines the interface for tick-driven strategies and the data they see.

use crate::error::Result;
use crate::scalping::ScalpingStrategy;
use crate::stubs::{DcaStrategy, GridStrategy};
use rust_decimal::Decimal;
use scalper_core::{
    BotSettings, BotStats, ExitReason, Position, Price, Quantity, StrategyKind, Timestamp,
    TradeIntent,
};
use serde::{Deserialize, Serialize};

/// The two most recent prices of a bot's history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceStep {
    pub current: Price,
    pub previous: Price,
    pub timestamp: Timestamp,
}

impl PriceStep {
    pub fn new(current: Price, previous: Price, timestamp: Timestamp) -> Self {
        Self {
            current,
            previous,
            timestamp,
        }
    }
}

/// Mutable view of the bot state a strategy is allowed to change
pub struct StrategyContext<'a> {
    pub settings: &'a BotSettings,
    pub position: &'a mut Option<Position>,
    pub stats: &'a mut BotStats,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        settings: &'a BotSettings,
        position: &'a mut Option<Position>,
        stats: &'a mut BotStats,
    ) -> Self {
        Self {
            settings,
            position,
            stats,
        }
    }
}

/// State change made during a tick, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Position opened
    Entered {
        price: Price,
        quantity: Quantity,
        delta_pct: Decimal,
        stop_price: Price,
    },
    /// Stop moved to the entry price
    BreakevenActivated { stop_price: Price },
    /// Stop now trails the highest price
    TrailingActivated { max_price: Price },
    /// Trailing stop moved up
    StopRaised {
        from: Price,
        to: Price,
        max_price: Price,
    },
    /// Position closed
    Exited {
        reason: ExitReason,
        price: Price,
        profit_quote: Decimal,
        profit_pct: Decimal,
    },
}

/// Result of evaluating one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// At most one trade intent per tick
    pub intent: Option<TradeIntent>,
    pub transitions: Vec<Transition>,
}

impl Evaluation {
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether anything about the position changed
    pub fn changed_state(&self) -> bool {
        !self.transitions.is_empty()
    }
}

/// Strategy trait - implement this for a tick-driven trading strategy
///
/// Evaluation is pure computation over the context: no I/O, and the state
/// change is committed before any resulting order is attempted.
pub trait TickStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Which strategy kind this implements
    fn kind(&self) -> StrategyKind;

    /// Evaluate one tick, mutating position/stats and returning what happened
    fn on_tick(&self, step: &PriceStep, ctx: &mut StrategyContext<'_>) -> Result<Evaluation>;
}

/// Build the strategy for a bot's configured kind
pub fn for_kind(kind: StrategyKind) -> Box<dyn TickStrategy> {
    match kind {
        StrategyKind::Scalping => Box::new(ScalpingStrategy::new()),
        StrategyKind::Grid => Box::new(GridStrategy),
        StrategyKind::Dca => Box::new(DcaStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ensure the trait is object-safe
    fn _assert_strategy_object_safe(_: &dyn TickStrategy) {}

    #[test]
    fn test_for_kind_matches_kind() {
        for kind in [StrategyKind::Scalping, StrategyKind::Grid, StrategyKind::Dca] {
            assert_eq!(for_kind(kind).kind(), kind);
        }
        assert_eq!(for_kind(StrategyKind::Scalping).name(), "Scalping");
    }
}
