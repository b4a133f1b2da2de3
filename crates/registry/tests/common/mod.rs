//! Shared wiring for registry integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use scalper_clock::ManualClock;
use scalper_core::{Bot, BotId, LogKind, Tick};
use scalper_gateway::ChannelPriceFeed;
use scalper_ports::{Clock, OrderAck, OrderError, OrderGateway, OrderRequest};
use scalper_registry::{BotRegistry, RegistryConfig, TradeLedger};
use scalper_store::MemoryStateStore;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Gateway that fills everything except the failures queued on it
#[derive(Default)]
pub struct StubGateway {
    failures: Mutex<VecDeque<OrderError>>,
    requests: Mutex<Vec<OrderRequest>>,
    /// Orders from this bot make the gateway panic
    panic_for: Mutex<Option<BotId>>,
}

impl StubGateway {
    pub fn fail_next(&self, error: OrderError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn panic_on_orders_from(&self, id: &BotId) {
        *self.panic_for.lock().unwrap() = Some(id.clone());
    }

    pub fn requests(&self) -> Vec<OrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderGateway for StubGateway {
    async fn submit_market_order(&self, request: &OrderRequest) -> Result<OrderAck, OrderError> {
        let broken = self.panic_for.lock().unwrap().clone();
        if let Some(id) = broken {
            if request.client_order_id.starts_with(id.as_str()) {
                panic!("gateway blew up on {}", request.client_order_id);
            }
        }
        self.requests.lock().unwrap().push(request.clone());
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(OrderAck {
            order_id: format!("stub-{}", self.requests.lock().unwrap().len()),
            client_order_id: request.client_order_id.clone(),
            filled_qty: request.quantity,
            avg_price: None,
        })
    }

    fn name(&self) -> &str {
        "StubGateway"
    }
}

pub struct Harness {
    pub registry: BotRegistry,
    pub feed: Arc<ChannelPriceFeed>,
    pub gateway: Arc<StubGateway>,
    pub store: Arc<MemoryStateStore>,
    pub ledger: Arc<TradeLedger>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStateStore::new()))
    }

    /// Fresh registry on top of an existing store, as after a restart
    pub fn with_store(store: Arc<MemoryStateStore>) -> Self {
        Self::build(store, Arc::new(TradeLedger::default()))
    }

    pub fn with_ledger(ledger: Arc<TradeLedger>) -> Self {
        Self::build(Arc::new(MemoryStateStore::new()), ledger)
    }

    fn build(store: Arc<MemoryStateStore>, ledger: Arc<TradeLedger>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let feed = Arc::new(ChannelPriceFeed::default());
        let gateway = Arc::new(StubGateway::default());
        let clock = ManualClock::new(Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));

        let registry = BotRegistry::new(
            feed.clone(),
            gateway.clone(),
            store.clone(),
            ledger.clone(),
            clock.clone(),
            RegistryConfig::default(),
        );

        Self {
            registry,
            feed,
            gateway,
            store,
            ledger,
            clock,
        }
    }

    pub fn tick(&self, symbol: &str, price: Decimal) -> Tick {
        Tick::new(symbol, price, self.clock.now())
    }

    /// Feed prices straight into the registry, bypassing the runner task
    pub async fn feed_prices(&self, id: &BotId, symbol: &str, prices: &[Decimal]) {
        for price in prices {
            self.clock.advance(chrono::Duration::seconds(1));
            self.registry
                .handle_tick(id, self.tick(symbol, *price))
                .await
                .unwrap();
        }
    }

    pub async fn bot(&self, id: &BotId) -> Bot {
        self.registry.get_bot(id).await.expect("bot exists")
    }

    /// Poll until the bot's price history reaches `len`
    pub async fn wait_for_history(&self, id: &BotId, len: usize) -> Bot {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let bot = self.bot(id).await;
                if bot.price_history.len() >= len {
                    return bot;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("ticks were not processed in time")
    }

    /// Poll until the bot's newest log entry has `kind`
    pub async fn wait_for_log(&self, id: &BotId, kind: LogKind) -> Bot {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let bot = self.bot(id).await;
                if bot.logs.front().is_some_and(|entry| entry.kind == kind) {
                    return bot;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("log entry did not appear in time")
    }
}
