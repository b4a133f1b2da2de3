//! Risk-Managed Scalping Strategy
//!
//! Buys a sharp per-tick dip and then protects the position in phases:
//! - Initial stop-loss right after entry
//! - Stop moved to the entry price once a minimum profit is reached (breakeven)
//! - Stop trailing the highest price once profit grows further
//! - Fixed take-profit while still waiting for the breakeven trigger
//!
//! Rules are evaluated once per tick in a fixed priority order. The hard
//! stop-loss is always checked first, so losses are cut before any gain is
//! locked in.

use crate::error::{Result, StrategyError};
use crate::strategy::{Evaluation, PriceStep, StrategyContext, TickStrategy, Transition};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scalper_core::{BotSettings, ExitReason, Phase, Position, Price, StrategyKind, TradeIntent};

/// The scalping position state machine
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalpingStrategy;

/// Figures an open position needs at the current price, computed up front so
/// an overflow is caught before the position is touched
struct Marks {
    profit_pct: Decimal,
    profit_quote: Decimal,
    /// Trailing stop for the highest price including this tick
    trailing_candidate: Price,
}

impl Marks {
    fn at(position: &Position, price: Price, settings: &BotSettings) -> Option<Self> {
        let max_price = price.max(position.max_price_since_entry);
        position.notional(price)?;

        Some(Self {
            profit_pct: position.profit_pct(price)?,
            profit_quote: position.profit_quote(price)?,
            trailing_candidate: trailing_stop(max_price, settings.trailing_distance_pct)?,
        })
    }
}

impl ScalpingStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Entry check, only while no position is open
    fn try_enter(&self, step: &PriceStep, ctx: &mut StrategyContext<'_>) -> Result<Evaluation> {
        let settings = ctx.settings;
        let delta_pct = (step.current - step.previous)
            .checked_div(step.previous)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .ok_or(StrategyError::Overflow(step.current))?;

        if delta_pct > settings.buy_threshold_pct {
            return Ok(Evaluation::none());
        }

        let position = Position::open(
            step.current,
            settings.trade_amount_quote,
            settings.stop_loss_pct,
            step.timestamp,
        )
        .ok_or(StrategyError::Overflow(step.current))?;
        let intent = TradeIntent::buy(
            step.current,
            position.quantity,
            settings.trade_amount_quote,
        );

        log::debug!(
            "[Scalping] BUY signal: delta={:.2}%, price={}, stop={}",
            delta_pct,
            step.current,
            position.stop_price
        );

        let transition = Transition::Entered {
            price: step.current,
            quantity: position.quantity,
            delta_pct,
            stop_price: position.stop_price,
        };
        *ctx.position = Some(position);

        Ok(Evaluation {
            intent: Some(intent),
            transitions: vec![transition],
        })
    }

    /// Manage an open position; returns the exit rule that fired, if any
    fn manage(
        &self,
        position: &mut Position,
        price: Price,
        marks: &Marks,
        ctx_settings: &BotSettings,
        transitions: &mut Vec<Transition>,
    ) -> Option<ExitReason> {
        let profit_pct = marks.profit_pct;

        if price > position.max_price_since_entry {
            position.max_price_since_entry = price;
        }

        if profit_pct <= ctx_settings.stop_loss_pct {
            return Some(ExitReason::StopLoss);
        }

        if position.phase == Phase::WaitingForProfit
            && profit_pct >= ctx_settings.break_even_trigger_pct
        {
            position.stop_price = position.entry_price;
            position.phase = Phase::Breakeven;
            transitions.push(Transition::BreakevenActivated {
                stop_price: position.stop_price,
            });
        }

        if position.phase == Phase::Breakeven && profit_pct >= ctx_settings.trailing_activation_pct
        {
            position.phase = Phase::Trailing;
            transitions.push(Transition::TrailingActivated {
                max_price: position.max_price_since_entry,
            });
        }

        if position.phase == Phase::Trailing {
            let candidate = marks.trailing_candidate;
            if candidate > position.stop_price {
                transitions.push(Transition::StopRaised {
                    from: position.stop_price,
                    to: candidate,
                    max_price: position.max_price_since_entry,
                });
                position.stop_price = candidate;
            }

            if price <= position.stop_price {
                return Some(ExitReason::TrailingStop);
            }
        }

        if position.phase == Phase::Breakeven && price <= position.stop_price {
            return Some(ExitReason::BreakevenStop);
        }

        if position.phase == Phase::WaitingForProfit
            && profit_pct >= ctx_settings.sell_threshold_pct
        {
            return Some(ExitReason::TakeProfit);
        }

        None
    }

    /// Close the open position at `price`, booking the result into stats
    fn close(
        &self,
        price: Price,
        reason: ExitReason,
        marks: &Marks,
        ctx: &mut StrategyContext<'_>,
        mut transitions: Vec<Transition>,
    ) -> Result<Evaluation> {
        let Some(quantity) = ctx.position.as_ref().map(|p| p.quantity) else {
            return Ok(Evaluation {
                intent: None,
                transitions,
            });
        };

        let profit_quote = marks.profit_quote;
        let profit_pct = marks.profit_pct;
        let intent = TradeIntent::sell(price, quantity, profit_quote, reason)
            .ok_or(StrategyError::Overflow(price))?;

        *ctx.position = None;
        ctx.stats.record_close(profit_quote);

        log::debug!(
            "[Scalping] SELL signal ({}): price={}, profit={} ({:.2}%)",
            reason,
            price,
            profit_quote,
            profit_pct
        );

        transitions.push(Transition::Exited {
            reason,
            price,
            profit_quote,
            profit_pct,
        });

        Ok(Evaluation {
            intent: Some(intent),
            transitions,
        })
    }
}

/// Stop price `distance_pct` percent below `max_price`
pub fn trailing_stop(max_price: Price, distance_pct: Decimal) -> Option<Price> {
    max_price.checked_mul(Decimal::ONE - distance_pct / dec!(100))
}

impl TickStrategy for ScalpingStrategy {
    fn name(&self) -> &str {
        "Scalping"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Scalping
    }

    fn on_tick(&self, step: &PriceStep, ctx: &mut StrategyContext<'_>) -> Result<Evaluation> {
        if step.current <= Decimal::ZERO || step.previous <= Decimal::ZERO {
            return Ok(Evaluation::none());
        }

        let settings = ctx.settings;
        let Some(position) = ctx.position.as_mut() else {
            return self.try_enter(step, ctx);
        };

        let marks = Marks::at(position, step.current, settings)
            .ok_or(StrategyError::Overflow(step.current))?;
        let mut transitions = Vec::new();
        let exit = self.manage(position, step.current, &marks, settings, &mut transitions);

        match exit {
            Some(reason) => self.close(step.current, reason, &marks, ctx, transitions),
            None => Ok(Evaluation {
                intent: None,
                transitions,
            }),
        }
    }
}
