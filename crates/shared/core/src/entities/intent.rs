use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::Side;
use crate::values::{Price, Quantity};

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    BreakevenStop,
    TakeProfit,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TrailingStop => "TRAILING_STOP",
            ExitReason::BreakevenStop => "BREAKEVEN_STOP",
            ExitReason::TakeProfit => "TAKE_PROFIT",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to buy or sell at the current price, produced by a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub side: Side,
    /// Price observed when the intent was produced
    pub price: Price,
    pub quantity: Quantity,
    /// Notional in quote currency
    pub amount_quote: Decimal,
    /// Realized profit, sells only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_quote: Option<Decimal>,
    /// Exit rule that fired, sells only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ExitReason>,
}

impl TradeIntent {
    pub fn buy(price: Price, quantity: Quantity, amount_quote: Decimal) -> Self {
        Self {
            side: Side::Buy,
            price,
            quantity,
            amount_quote,
            profit_quote: None,
            reason: None,
        }
    }

    /// Sell intent; `None` if the notional does not fit a Decimal
    pub fn sell(
        price: Price,
        quantity: Quantity,
        profit_quote: Decimal,
        reason: ExitReason,
    ) -> Option<Self> {
        Some(Self {
            side: Side::Sell,
            price,
            quantity,
            amount_quote: quantity.checked_mul(price)?,
            profit_quote: Some(profit_quote),
            reason: Some(reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sell_intent_amount_is_notional() {
        let intent = TradeIntent::sell(dec!(105), dec!(0.1), dec!(0.5), ExitReason::TakeProfit).unwrap();
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.amount_quote, dec!(10.5));
        assert_eq!(intent.reason, Some(ExitReason::TakeProfit));
    }
}
