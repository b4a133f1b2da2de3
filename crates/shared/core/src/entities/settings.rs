//! Bot settings
//!
//! `BotSettings` is the validated form the engine works with. Raw user input
//! arrives as `SettingsInput`, where any field may be missing or not a number;
//! conversion never fails and substitutes defaults instead.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Validated risk and entry settings for a bot (all percentages signed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    /// Per-tick price change (%) at or below which a position is opened
    pub buy_threshold_pct: Decimal,
    /// Profit (%) that closes a position before breakeven is reached
    pub sell_threshold_pct: Decimal,
    /// Quote amount spent on each entry
    pub trade_amount_quote: Decimal,
    /// Loss (%) that always closes the position
    pub stop_loss_pct: Decimal,
    /// Profit (%) that turns a breakeven stop into a trailing stop
    pub trailing_activation_pct: Decimal,
    /// Distance (%) of the trailing stop below the highest price since entry
    pub trailing_distance_pct: Decimal,
    /// Profit (%) that moves the stop to the entry price
    pub break_even_trigger_pct: Decimal,
}

impl BotSettings {
    pub const DEFAULT_BUY_THRESHOLD_PCT: Decimal = dec!(-0.5);
    pub const DEFAULT_SELL_THRESHOLD_PCT: Decimal = dec!(0.5);
    pub const DEFAULT_TRADE_AMOUNT_QUOTE: Decimal = dec!(10);
    pub const DEFAULT_STOP_LOSS_PCT: Decimal = dec!(-2.0);
    pub const DEFAULT_TRAILING_ACTIVATION_PCT: Decimal = dec!(0.3);
    pub const DEFAULT_TRAILING_DISTANCE_PCT: Decimal = dec!(0.2);
    pub const DEFAULT_BREAK_EVEN_TRIGGER_PCT: Decimal = dec!(0.5);
    /// Largest quote amount a single entry may spend
    pub const MAX_TRADE_AMOUNT_QUOTE: Decimal = dec!(1000000);

    pub const BUY_THRESHOLD_RANGE: (Decimal, Decimal) = (dec!(-5), dec!(0));
    pub const SELL_THRESHOLD_RANGE: (Decimal, Decimal) = (dec!(0.1), dec!(10));
    pub const STOP_LOSS_RANGE: (Decimal, Decimal) = (dec!(-10), dec!(0));
    pub const BREAK_EVEN_TRIGGER_RANGE: (Decimal, Decimal) = (dec!(0.1), dec!(5));
    pub const TRAILING_ACTIVATION_RANGE: (Decimal, Decimal) = (dec!(0.1), dec!(5));
    pub const TRAILING_DISTANCE_RANGE: (Decimal, Decimal) = (dec!(0.05), dec!(2));

    /// Build validated settings from raw input, defaulting and clamping each field
    pub fn from_input(input: &SettingsInput) -> Self {
        let trade_amount_quote = coerce(input.trade_amount_quote, Self::DEFAULT_TRADE_AMOUNT_QUOTE);

        Self {
            buy_threshold_pct: clamp(
                coerce(input.buy_threshold_pct, Self::DEFAULT_BUY_THRESHOLD_PCT),
                Self::BUY_THRESHOLD_RANGE,
            ),
            sell_threshold_pct: clamp(
                coerce(input.sell_threshold_pct, Self::DEFAULT_SELL_THRESHOLD_PCT),
                Self::SELL_THRESHOLD_RANGE,
            ),
            trade_amount_quote: trade_amount(trade_amount_quote),
            stop_loss_pct: clamp(
                coerce(input.stop_loss_pct, Self::DEFAULT_STOP_LOSS_PCT),
                Self::STOP_LOSS_RANGE,
            ),
            trailing_activation_pct: clamp(
                coerce(
                    input.trailing_activation_pct,
                    Self::DEFAULT_TRAILING_ACTIVATION_PCT,
                ),
                Self::TRAILING_ACTIVATION_RANGE,
            ),
            trailing_distance_pct: clamp(
                coerce(input.trailing_distance_pct, Self::DEFAULT_TRAILING_DISTANCE_PCT),
                Self::TRAILING_DISTANCE_RANGE,
            ),
            break_even_trigger_pct: clamp(
                coerce(
                    input.break_even_trigger_pct,
                    Self::DEFAULT_BREAK_EVEN_TRIGGER_PCT,
                ),
                Self::BREAK_EVEN_TRIGGER_RANGE,
            ),
        }
    }

    /// Re-apply the input ranges to already typed settings
    pub fn clamped(self) -> Self {
        Self {
            buy_threshold_pct: clamp(self.buy_threshold_pct, Self::BUY_THRESHOLD_RANGE),
            sell_threshold_pct: clamp(self.sell_threshold_pct, Self::SELL_THRESHOLD_RANGE),
            trade_amount_quote: trade_amount(self.trade_amount_quote),
            stop_loss_pct: clamp(self.stop_loss_pct, Self::STOP_LOSS_RANGE),
            trailing_activation_pct: clamp(
                self.trailing_activation_pct,
                Self::TRAILING_ACTIVATION_RANGE,
            ),
            trailing_distance_pct: clamp(self.trailing_distance_pct, Self::TRAILING_DISTANCE_RANGE),
            break_even_trigger_pct: clamp(
                self.break_even_trigger_pct,
                Self::BREAK_EVEN_TRIGGER_RANGE,
            ),
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            buy_threshold_pct: Self::DEFAULT_BUY_THRESHOLD_PCT,
            sell_threshold_pct: Self::DEFAULT_SELL_THRESHOLD_PCT,
            trade_amount_quote: Self::DEFAULT_TRADE_AMOUNT_QUOTE,
            stop_loss_pct: Self::DEFAULT_STOP_LOSS_PCT,
            trailing_activation_pct: Self::DEFAULT_TRAILING_ACTIVATION_PCT,
            trailing_distance_pct: Self::DEFAULT_TRAILING_DISTANCE_PCT,
            break_even_trigger_pct: Self::DEFAULT_BREAK_EVEN_TRIGGER_PCT,
        }
    }
}

/// Raw settings as submitted by a user or config file
///
/// Every field is optional and may hold NaN or infinity; see
/// [`BotSettings::from_input`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsInput {
    pub buy_threshold_pct: Option<f64>,
    pub sell_threshold_pct: Option<f64>,
    pub trade_amount_quote: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub trailing_activation_pct: Option<f64>,
    pub trailing_distance_pct: Option<f64>,
    pub break_even_trigger_pct: Option<f64>,
}

impl From<BotSettings> for SettingsInput {
    fn from(settings: BotSettings) -> Self {
        Self {
            buy_threshold_pct: settings.buy_threshold_pct.to_f64(),
            sell_threshold_pct: settings.sell_threshold_pct.to_f64(),
            trade_amount_quote: settings.trade_amount_quote.to_f64(),
            stop_loss_pct: settings.stop_loss_pct.to_f64(),
            trailing_activation_pct: settings.trailing_activation_pct.to_f64(),
            trailing_distance_pct: settings.trailing_distance_pct.to_f64(),
            break_even_trigger_pct: settings.break_even_trigger_pct.to_f64(),
        }
    }
}

fn coerce(value: Option<f64>, default: Decimal) -> Decimal {
    value
        .filter(|v| v.is_finite())
        .and_then(Decimal::from_f64)
        .unwrap_or(default)
}

fn clamp(value: Decimal, (min, max): (Decimal, Decimal)) -> Decimal {
    value.clamp(min, max)
}

/// Non-positive amounts fall back to the default, large ones are capped
fn trade_amount(value: Decimal) -> Decimal {
    if value > Decimal::ZERO {
        value.min(BotSettings::MAX_TRADE_AMOUNT_QUOTE)
    } else {
        BotSettings::DEFAULT_TRADE_AMOUNT_QUOTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_defaults() {
        let settings = BotSettings::from_input(&SettingsInput::default());
        assert_eq!(settings, BotSettings::default());
        assert_eq!(settings.stop_loss_pct, dec!(-2));
        assert_eq!(settings.trailing_distance_pct, dec!(0.2));
    }

    #[test]
    fn test_nan_and_infinite_fall_back_to_defaults() {
        let input = SettingsInput {
            buy_threshold_pct: Some(f64::NAN),
            sell_threshold_pct: Some(f64::INFINITY),
            trade_amount_quote: Some(f64::NEG_INFINITY),
            ..Default::default()
        };
        let settings = BotSettings::from_input(&input);

        assert_eq!(settings.buy_threshold_pct, dec!(-0.5));
        assert_eq!(settings.sell_threshold_pct, dec!(0.5));
        assert_eq!(settings.trade_amount_quote, dec!(10));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let input = SettingsInput {
            buy_threshold_pct: Some(-12.0),
            sell_threshold_pct: Some(0.01),
            stop_loss_pct: Some(3.0),
            trailing_activation_pct: Some(9.0),
            trailing_distance_pct: Some(0.001),
            break_even_trigger_pct: Some(50.0),
            ..Default::default()
        };
        let settings = BotSettings::from_input(&input);

        assert_eq!(settings.buy_threshold_pct, dec!(-5));
        assert_eq!(settings.sell_threshold_pct, dec!(0.1));
        assert_eq!(settings.stop_loss_pct, dec!(0));
        assert_eq!(settings.trailing_activation_pct, dec!(5));
        assert_eq!(settings.trailing_distance_pct, dec!(0.05));
        assert_eq!(settings.break_even_trigger_pct, dec!(5));
    }

    #[test]
    fn test_non_positive_trade_amount_uses_default() {
        let input = SettingsInput {
            trade_amount_quote: Some(-25.0),
            ..Default::default()
        };
        assert_eq!(BotSettings::from_input(&input).trade_amount_quote, dec!(10));
    }

    #[test]
    fn test_huge_trade_amount_is_capped() {
        let input = SettingsInput {
            trade_amount_quote: Some(1e27),
            ..Default::default()
        };
        let settings = BotSettings::from_input(&input);
        assert_eq!(settings.trade_amount_quote, BotSettings::MAX_TRADE_AMOUNT_QUOTE);

        let typed = BotSettings {
            trade_amount_quote: dec!(50000000),
            ..Default::default()
        };
        assert_eq!(typed.clamped().trade_amount_quote, dec!(1000000));
    }

    #[test]
    fn test_in_range_values_are_kept_exactly() {
        let input = SettingsInput {
            buy_threshold_pct: Some(-0.6),
            trade_amount_quote: Some(25.5),
            trailing_distance_pct: Some(0.15),
            ..Default::default()
        };
        let settings = BotSettings::from_input(&input);

        assert_eq!(settings.buy_threshold_pct, dec!(-0.6));
        assert_eq!(settings.trade_amount_quote, dec!(25.5));
        assert_eq!(settings.trailing_distance_pct, dec!(0.15));
    }

    #[test]
    fn test_input_deserializes_with_missing_fields() {
        let input: SettingsInput = serde_json::from_str(r#"{"stop_loss_pct": -1.5}"#).unwrap();
        assert_eq!(input.stop_loss_pct, Some(-1.5));
        assert!(input.buy_threshold_pct.is_none());
    }
}
