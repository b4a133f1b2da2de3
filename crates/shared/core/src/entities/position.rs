use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::{Price, Quantity, Timestamp};

/// Risk-management sub-state of a bot
///
/// Only `Idle` is valid without an open position; the other three describe
/// which stop rule currently protects the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// No open position
    #[default]
    Idle,
    /// Position open, protected by the initial stop-loss
    WaitingForProfit,
    /// Stop moved to the entry price
    Breakeven,
    /// Stop follows the highest price since entry
    Trailing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::WaitingForProfit => "WAITING_FOR_PROFIT",
            Phase::Breakeven => "BREAKEVEN",
            Phase::Trailing => "TRAILING",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open long position held by a bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Price at which the position was opened
    pub entry_price: Price,
    /// Base quantity bought
    pub quantity: Quantity,
    /// Highest price seen since entry
    pub max_price_since_entry: Price,
    /// Price at or below which the position is closed
    pub stop_price: Price,
    /// Current risk-management phase (never `Idle` while open)
    pub phase: Phase,
    /// When the position was opened
    pub opened_at: Timestamp,
}

impl Position {
    /// Open a position spending `amount_quote` at `price`
    ///
    /// Returns `None` when the quantity or stop cannot be represented.
    pub fn open(
        price: Price,
        amount_quote: Decimal,
        stop_loss_pct: Decimal,
        now: Timestamp,
    ) -> Option<Self> {
        let quantity = amount_quote.checked_div(price)?;
        let stop_price = price.checked_mul(Decimal::ONE + stop_loss_pct / dec!(100))?;

        Some(Self {
            entry_price: price,
            quantity,
            max_price_since_entry: price,
            stop_price,
            phase: Phase::WaitingForProfit,
            opened_at: now,
        })
    }

    /// Unrealized profit in percent of the entry price
    pub fn profit_pct(&self, price: Price) -> Option<Decimal> {
        (price - self.entry_price)
            .checked_div(self.entry_price)?
            .checked_mul(dec!(100))
    }

    /// Unrealized profit in quote currency
    pub fn profit_quote(&self, price: Price) -> Option<Decimal> {
        (price - self.entry_price).checked_mul(self.quantity)
    }

    /// Current notional value in quote currency
    pub fn notional(&self, price: Price) -> Option<Decimal> {
        self.quantity.checked_mul(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_open_position_sets_initial_stop() {
        let pos = Position::open(dec!(100), dec!(10), dec!(-2), Utc::now()).unwrap();

        assert_eq!(pos.entry_price, dec!(100));
        assert_eq!(pos.quantity, dec!(0.1));
        assert_eq!(pos.max_price_since_entry, dec!(100));
        assert_eq!(pos.stop_price, dec!(98));
        assert_eq!(pos.phase, Phase::WaitingForProfit);
    }

    #[test]
    fn test_profit_calculations() {
        let pos = Position::open(dec!(100), dec!(50), dec!(-2), Utc::now()).unwrap();

        assert_eq!(pos.profit_pct(dec!(101)), Some(dec!(1)));
        assert_eq!(pos.profit_pct(dec!(97.9)), Some(dec!(-2.1)));
        assert_eq!(pos.profit_quote(dec!(102)), Some(dec!(1)));
        assert_eq!(pos.notional(dec!(102)), Some(dec!(51)));
    }

    #[test]
    fn test_unrepresentable_position_is_refused() {
        // Quantity would exceed the Decimal range
        let tiny = dec!(0.0000000001);
        let amount = dec!(1000000000000000000);
        assert!(Position::open(tiny, amount, dec!(-2), Utc::now()).is_none());

        let pos = Position::open(tiny, dec!(1), dec!(-2), Utc::now()).unwrap();
        assert!(pos.profit_pct(Decimal::MAX).is_none());
        assert!(pos.profit_quote(Decimal::MAX).is_none());
    }

    #[test]
    fn test_phase_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&Phase::WaitingForProfit).unwrap();
        assert_eq!(json, "\"WAITING_FOR_PROFIT\"");
        assert_eq!(Phase::Trailing.to_string(), "TRAILING");
    }
}
