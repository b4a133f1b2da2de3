//! Placeholder strategies
//!
//! Grid trading and dollar-cost averaging can be selected for a bot but have
//! no trading logic. They say so on every tick instead of silently idling.

use crate::error::{Result, StrategyError};
use crate::strategy::{Evaluation, PriceStep, StrategyContext, TickStrategy};
use scalper_core::StrategyKind;

/// Grid trading (not implemented)
#[derive(Debug, Default, Clone, Copy)]
pub struct GridStrategy;

impl TickStrategy for GridStrategy {
    fn name(&self) -> &str {
        "Grid"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Grid
    }

    fn on_tick(&self, _step: &PriceStep, _ctx: &mut StrategyContext<'_>) -> Result<Evaluation> {
        Err(StrategyError::NotImplemented(StrategyKind::Grid))
    }
}

/// Dollar-cost averaging (not implemented)
#[derive(Debug, Default, Clone, Copy)]
pub struct DcaStrategy;

impl TickStrategy for DcaStrategy {
    fn name(&self) -> &str {
        "Dca"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Dca
    }

    fn on_tick(&self, _step: &PriceStep, _ctx: &mut StrategyContext<'_>) -> Result<Evaluation> {
        Err(StrategyError::NotImplemented(StrategyKind::Dca))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use scalper_core::{BotSettings, BotStats};

    #[test]
    fn test_stubs_report_not_implemented() {
        let settings = BotSettings::default();
        let mut position = None;
        let mut stats = BotStats::default();
        let mut ctx = StrategyContext::new(&settings, &mut position, &mut stats);
        let step = PriceStep::new(dec!(99), dec!(100), Utc::now());

        assert_eq!(
            GridStrategy.on_tick(&step, &mut ctx),
            Err(StrategyError::NotImplemented(StrategyKind::Grid))
        );
        assert_eq!(
            DcaStrategy.on_tick(&step, &mut ctx),
            Err(StrategyError::NotImplemented(StrategyKind::Dca))
        );
        assert!(position.is_none());
    }
}
