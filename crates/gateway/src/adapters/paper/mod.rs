//! Paper trading gateway
//!
//! Fills market orders immediately at the last known price for the symbol and
//! keeps balances locally. Orders are checked the way a spot exchange checks
//! them: symbol, lot size, minimum notional, then balance.

mod config;

pub use config::{PaperGatewayConfig, SymbolRules};

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use scalper_core::{Price, Quantity, Side, Symbol};
use scalper_ports::{OrderAck, OrderError, OrderGateway, OrderRequest, TickSubscription};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Simulated spot exchange account
pub struct PaperOrderGateway {
    config: PaperGatewayConfig,
    /// Last price per symbol, used as the fill price
    marks: DashMap<Symbol, Price>,
    /// Balances by asset
    balances: Mutex<HashMap<String, Decimal>>,
    fills: AtomicU64,
}

impl PaperOrderGateway {
    pub fn new(config: PaperGatewayConfig) -> Self {
        let mut balances = config.base_balances.clone();
        balances.insert(config.quote_asset.clone(), config.quote_balance);

        Self {
            config,
            marks: DashMap::new(),
            balances: Mutex::new(balances),
            fills: AtomicU64::new(0),
        }
    }

    /// Set the price orders on `symbol` fill at
    pub fn set_mark_price(&self, symbol: &str, price: Price) {
        self.marks.insert(symbol.to_string(), price);
    }

    pub fn mark_price(&self, symbol: &str) -> Option<Price> {
        self.marks.get(symbol).map(|p| *p)
    }

    /// Keep the mark price of a symbol in sync with a tick subscription
    pub fn follow(self: &Arc<Self>, mut subscription: TickSubscription) -> JoinHandle<()> {
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(tick) = subscription.recv().await {
                gateway.set_mark_price(&tick.symbol, tick.price);
            }
            debug!(
                "[PaperOrderGateway] Stopped following {}",
                subscription.symbol()
            );
        })
    }

    /// Current balance of an asset
    pub async fn balance(&self, asset: &str) -> Decimal {
        self.balances
            .lock()
            .await
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Snapshot of every non-zero balance
    pub async fn balances(&self) -> HashMap<String, Decimal> {
        self.balances
            .lock()
            .await
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(asset, amount)| (asset.clone(), *amount))
            .collect()
    }

    /// Number of filled orders
    pub fn fill_count(&self) -> u64 {
        self.fills.load(Ordering::Relaxed)
    }

    /// Floor `quantity` to the symbol's step size
    fn round_to_step(quantity: Quantity, step: Decimal) -> Option<Quantity> {
        if step <= Decimal::ZERO {
            return Some(quantity);
        }
        let steps = quantity.checked_div(step)?.floor();
        Some(steps.checked_mul(step)?.normalize())
    }

    fn validate(
        &self,
        request: &OrderRequest,
        rules: &SymbolRules,
        price: Price,
    ) -> Result<(Quantity, Decimal), OrderError> {
        let out_of_range = || OrderError::SizeOutOfRange(request.symbol.clone());
        let quantity =
            Self::round_to_step(request.quantity, rules.step_size).ok_or_else(out_of_range)?;

        if quantity <= Decimal::ZERO || quantity < rules.min_qty {
            return Err(OrderError::BelowMinQuantity {
                symbol: request.symbol.clone(),
                quantity,
                min: rules.min_qty,
            });
        }

        let notional = quantity.checked_mul(price).ok_or_else(out_of_range)?;
        if notional < rules.min_notional {
            return Err(OrderError::BelowMinNotional {
                symbol: request.symbol.clone(),
                notional,
                min: rules.min_notional,
            });
        }

        Ok((quantity, notional))
    }
}

#[async_trait]
impl OrderGateway for PaperOrderGateway {
    async fn submit_market_order(&self, request: &OrderRequest) -> Result<OrderAck, OrderError> {
        let rules = self
            .config
            .rules_for(&request.symbol)
            .ok_or_else(|| OrderError::InvalidSymbol(request.symbol.clone()))?;

        let price = self.mark_price(&request.symbol).ok_or_else(|| {
            OrderError::Transport(format!("no market price for {}", request.symbol))
        })?;

        let (quantity, notional) = self.validate(request, &rules, price)?;
        let quote = self.config.quote_asset.as_str();

        {
            let mut balances = self.balances.lock().await;
            let (spend_asset, spend, receive_asset, receive) = match request.side {
                Side::Buy => (quote, notional, rules.base_asset.as_str(), quantity),
                Side::Sell => (rules.base_asset.as_str(), quantity, quote, notional),
            };

            let available = balances.get(spend_asset).copied().unwrap_or(Decimal::ZERO);
            if available < spend {
                warn!(
                    "[PaperOrderGateway] {} {} {} rejected: insufficient {}",
                    request.side, quantity, request.symbol, spend_asset
                );
                return Err(OrderError::InsufficientBalance {
                    asset: spend_asset.to_string(),
                    required: spend,
                    available,
                });
            }

            let held = balances.get(receive_asset).copied().unwrap_or(Decimal::ZERO);
            let received = held
                .checked_add(receive)
                .ok_or_else(|| OrderError::SizeOutOfRange(request.symbol.clone()))?;

            balances.insert(spend_asset.to_string(), available - spend);
            balances.insert(receive_asset.to_string(), received);
        }

        self.fills.fetch_add(1, Ordering::Relaxed);
        let order_id = Uuid::new_v4().to_string();

        info!(
            "[PaperOrderGateway] Filled {} {} {} @ {} (order {})",
            request.side, quantity, request.symbol, price, order_id
        );

        Ok(OrderAck {
            order_id,
            client_order_id: request.client_order_id.clone(),
            filled_qty: quantity,
            avg_price: Some(price),
        })
    }

    fn name(&self) -> &str {
        "PaperOrderGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gateway() -> PaperOrderGateway {
        let config = PaperGatewayConfig {
            quote_balance: dec!(100),
            ..Default::default()
        };
        let gateway = PaperOrderGateway::new(config);
        gateway.set_mark_price("BTCUSDT", dec!(50000));
        gateway
    }

    #[tokio::test]
    async fn test_buy_then_sell_moves_balances() {
        let gw = gateway();

        let ack = gw
            .submit_market_order(&OrderRequest::market("c1", "BTCUSDT", Side::Buy, dec!(0.001)))
            .await
            .unwrap();
        assert_eq!(ack.filled_qty, dec!(0.001));
        assert_eq!(ack.avg_price, Some(dec!(50000)));
        assert_eq!(ack.client_order_id, "c1");
        assert_eq!(gw.balance("USDT").await, dec!(50));
        assert_eq!(gw.balance("BTC").await, dec!(0.001));

        gw.set_mark_price("BTCUSDT", dec!(51000));
        gw.submit_market_order(&OrderRequest::market("c2", "BTCUSDT", Side::Sell, dec!(0.001)))
            .await
            .unwrap();
        assert_eq!(gw.balance("USDT").await, dec!(101));
        assert_eq!(gw.balance("BTC").await, dec!(0));
        assert_eq!(gw.fill_count(), 2);
    }

    #[tokio::test]
    async fn test_quantity_floored_to_step() {
        let gw = gateway();
        let ack = gw
            .submit_market_order(&OrderRequest::market(
                "c1",
                "BTCUSDT",
                Side::Buy,
                dec!(0.000199999),
            ))
            .await
            .unwrap();
        assert_eq!(ack.filled_qty, dec!(0.00019));
    }

    #[tokio::test]
    async fn test_rejections() {
        let gw = gateway();

        let err = gw
            .submit_market_order(&OrderRequest::market("c", "NOPE", Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::InvalidSymbol("NOPE".to_string()));

        let err = gw
            .submit_market_order(&OrderRequest::market("c", "BTCUSDT", Side::Buy, dec!(0.000001)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::BelowMinQuantity { .. }));

        // 0.00005 * 50000 = 2.5 < 5
        let err = gw
            .submit_market_order(&OrderRequest::market("c", "BTCUSDT", Side::Buy, dec!(0.00005)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::BelowMinNotional { .. }));

        let err = gw
            .submit_market_order(&OrderRequest::market("c", "BTCUSDT", Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientBalance {
                asset: "USDT".to_string(),
                required: dec!(50000),
                available: dec!(100),
            }
        );

        let err = gw
            .submit_market_order(&OrderRequest::market("c", "BTCUSDT", Side::Sell, dec!(0.001)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientBalance { ref asset, .. } if asset == "BTC"));

        assert_eq!(gw.fill_count(), 0);
        assert_eq!(gw.balance("USDT").await, dec!(100));
    }

    #[tokio::test]
    async fn test_unrepresentable_notional_is_rejected() {
        let gw = gateway();
        gw.set_mark_price("BTCUSDT", Decimal::MAX);

        let err = gw
            .submit_market_order(&OrderRequest::market("c", "BTCUSDT", Side::Sell, dec!(10)))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::SizeOutOfRange("BTCUSDT".to_string()));
        assert_eq!(gw.fill_count(), 0);
    }

    #[tokio::test]
    async fn test_no_mark_price() {
        let gw = PaperOrderGateway::new(PaperGatewayConfig::default());
        let err = gw
            .submit_market_order(&OrderRequest::market("c", "ETHUSDT", Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Transport(_)));
    }
}
