//! Paper exchange configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trading rules of one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRules {
    /// Base asset bought and sold, e.g. `BTC`
    pub base_asset: String,
    /// Smallest accepted quantity after step rounding
    pub min_qty: Decimal,
    /// Quantity increment; quantities are floored to a multiple of it
    pub step_size: Decimal,
    /// Smallest accepted order value in quote currency
    pub min_notional: Decimal,
}

impl SymbolRules {
    pub fn new(base_asset: impl Into<String>) -> Self {
        Self {
            base_asset: base_asset.into(),
            min_qty: dec!(0.00001),
            step_size: dec!(0.00001),
            min_notional: dec!(5),
        }
    }
}

/// Configuration of the paper order gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperGatewayConfig {
    /// Quote asset every symbol is priced in
    pub quote_asset: String,
    /// Starting quote balance
    pub quote_balance: Decimal,
    /// Starting base balances, by asset
    pub base_balances: HashMap<String, Decimal>,
    /// Explicit per-symbol rules
    pub symbols: HashMap<String, SymbolRules>,
    /// Accept any `<BASE><quote_asset>` symbol with default rules
    pub allow_unlisted: bool,
}

impl Default for PaperGatewayConfig {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            quote_balance: dec!(10000),
            base_balances: HashMap::new(),
            symbols: HashMap::new(),
            allow_unlisted: true,
        }
    }
}

impl PaperGatewayConfig {
    /// Add explicit rules for a symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>, rules: SymbolRules) -> Self {
        self.symbols.insert(symbol.into(), rules);
        self
    }

    /// Rules that apply to `symbol`, if it is tradable
    pub fn rules_for(&self, symbol: &str) -> Option<SymbolRules> {
        if let Some(rules) = self.symbols.get(symbol) {
            return Some(rules.clone());
        }
        if !self.allow_unlisted {
            return None;
        }
        let base = symbol.strip_suffix(self.quote_asset.as_str())?;
        if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(SymbolRules::new(base))
    }
}
