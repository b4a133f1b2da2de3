//! Simulated price feed
//!
//! Random-walk ticker for paper trading. Each step moves every configured
//! symbol by a uniform random fraction of `volatility` and reports the change
//! since the first price as the 24h change.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use scalper_core::{Price, Symbol, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the simulated feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedFeedConfig {
    /// Starting price per symbol
    pub initial_prices: BTreeMap<Symbol, Price>,
    /// Largest per-tick move as a fraction, e.g. 0.008 = 0.8%
    pub volatility: Decimal,
    /// Delay between steps
    pub interval_ms: u64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatedFeedConfig {
    fn default() -> Self {
        let mut initial_prices = BTreeMap::new();
        initial_prices.insert("BTCUSDT".to_string(), dec!(65000));
        initial_prices.insert("ETHUSDT".to_string(), dec!(3200));

        Self {
            initial_prices,
            volatility: dec!(0.008),
            interval_ms: 1000,
            seed: None,
        }
    }
}

/// Generates ticks for every configured symbol
pub struct SimulatedPriceFeed {
    prices: BTreeMap<Symbol, Price>,
    opens: BTreeMap<Symbol, Price>,
    volatility: Decimal,
    rng: StdRng,
}

impl SimulatedPriceFeed {
    pub fn new(config: &SimulatedFeedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Non-positive prices would never produce a valid tick
        let prices: BTreeMap<Symbol, Price> = config
            .initial_prices
            .iter()
            .filter(|(_, price)| **price > Decimal::ZERO)
            .map(|(symbol, price)| (symbol.trim().to_uppercase(), *price))
            .collect();

        Self {
            opens: prices.clone(),
            prices,
            volatility: config.volatility.clamp(Decimal::ZERO, dec!(0.5)),
            rng,
        }
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.prices.keys().cloned().collect()
    }

    pub fn price(&self, symbol: &str) -> Option<Price> {
        self.prices.get(symbol).copied()
    }

    /// Advance every symbol one step
    pub fn step(&mut self, now: DateTime<Utc>) -> Vec<Tick> {
        let mut ticks = Vec::with_capacity(self.prices.len());

        for (symbol, price) in self.prices.iter_mut() {
            let draw: f64 = self.rng.gen_range(-1.0..1.0);
            let change = Decimal::from_f64(draw).unwrap_or(Decimal::ZERO) * self.volatility;
            let next = (*price * (Decimal::ONE + change)).round_dp(8);
            if next > Decimal::ZERO {
                *price = next;
            }

            let mut tick = Tick::new(symbol.clone(), *price, now);
            if let Some(open) = self.opens.get(symbol) {
                let pct = ((*price - *open) / *open * dec!(100)).round_dp(2);
                tick = tick.with_change_24h(pct);
            }
            ticks.push(tick);
        }

        ticks
    }
}
