//! Bootstrap - wiring and process lifecycle
//!
//! Builds the engine from an [`AppConfig`]:
//! - JSON file store under `<state_dir>/bots`
//! - Trade ledger loaded from its JSON file
//! - Paper gateway and channel price feed
//! - Registry restored from the store, seeded from `bots` on first launch
//!
//! The simulated feed runs in its own task and stamps the paper gateway's
//! mark price before publishing, so fills happen at the tick's price.

use crate::config::AppConfig;
use crate::error::Result;
use crate::event_feed::SimulatedPriceFeed;
use scalper_clock::SystemClock;
use scalper_core::BotId;
use scalper_gateway::{ChannelPriceFeed, PaperOrderGateway};
use scalper_ports::Clock;
use scalper_registry::{BotRegistry, BotUpdate, TradeLedger, UpdateKind};
use scalper_store::JsonFileStateStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::task::JoinHandle;

/// A wired-up engine
pub struct App {
    pub registry: BotRegistry,
    pub feed: Arc<ChannelPriceFeed>,
    pub gateway: Arc<PaperOrderGateway>,
    pub ledger: Arc<TradeLedger>,
    clock: Arc<dyn Clock>,
    simulator: Arc<Mutex<SimulatedPriceFeed>>,
    interval: Duration,
}

impl App {
    /// Wire every component and bring stored bots back
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new())).await
    }

    pub async fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Arc::new(JsonFileStateStore::open(config.bots_dir()).await?);
        let ledger = Arc::new(TradeLedger::open(config.ledger_config()).await);
        let feed = Arc::new(ChannelPriceFeed::default());
        let gateway = Arc::new(PaperOrderGateway::new(config.gateway.clone()));

        let registry = BotRegistry::new(
            feed.clone(),
            gateway.clone(),
            store,
            ledger.clone(),
            clock.clone(),
            config.registry.clone(),
        );

        let resumed = registry.restore().await?;
        log::info!(
            "Restored {} bots from {} ({} running)",
            registry.len(),
            config.bots_dir().display(),
            resumed
        );

        if registry.is_empty() {
            for spec in &config.bots {
                let id = registry
                    .create_bot(&spec.symbol, spec.strategy, &spec.settings)
                    .await;
                if spec.start {
                    if let Err(e) = registry.start_bot(&id).await {
                        log::error!("[{}] Could not start: {}", id, e);
                    }
                }
            }
        }

        let simulator = SimulatedPriceFeed::new(&config.feed);
        log::info!(
            "Simulated feed on {:?} every {}ms",
            simulator.symbols(),
            config.feed.interval_ms
        );

        Ok(Self {
            registry,
            feed,
            gateway,
            ledger,
            clock,
            simulator: Arc::new(Mutex::new(simulator)),
            interval: Duration::from_millis(config.feed.interval_ms.max(1)),
        })
    }

    /// Produce and publish one round of ticks
    ///
    /// Returns how many bot subscriptions received a tick.
    pub async fn step_feed(&self) -> usize {
        publish_step(&self.simulator, &self.feed, &self.gateway, self.clock.as_ref()).await
    }

    /// Run the simulated feed until `shutdown` resolves, then stop cleanly
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let feed_task = self.spawn_feed(stop_rx);
        let report_task = spawn_trade_reporter(self.registry.subscribe_changes());

        shutdown.await;
        log::info!("Shutting down...");

        let _ = stop_tx.send(());
        if let Err(e) = feed_task.await {
            log::warn!("Feed task ended abnormally: {}", e);
        }
        self.shutdown().await;
        report_task.abort();
    }

    /// Stop every bot task and flush state
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;

        let stats = self.ledger.stats();
        log::info!(
            "Session ledger: {} trades ({} ok, {} failed), profit {}",
            stats.total_trades,
            stats.successful_trades,
            stats.failed_trades,
            stats.total_profit
        );
    }

    /// Bots known to the registry, oldest first
    pub async fn bot_ids(&self) -> Vec<BotId> {
        self.registry
            .get_all_bots()
            .await
            .into_iter()
            .map(|bot| bot.id)
            .collect()
    }

    fn spawn_feed(&self, mut stop_rx: oneshot::Receiver<()>) -> JoinHandle<()> {
        let simulator = Arc::clone(&self.simulator);
        let feed = Arc::clone(&self.feed);
        let gateway = Arc::clone(&self.gateway);
        let clock = Arc::clone(&self.clock);
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        publish_step(&simulator, &feed, &gateway, clock.as_ref()).await;
                    }
                }
            }
            log::debug!("Simulated feed stopped");
        })
    }
}

async fn publish_step(
    simulator: &Mutex<SimulatedPriceFeed>,
    feed: &ChannelPriceFeed,
    gateway: &PaperOrderGateway,
    clock: &dyn Clock,
) -> usize {
    let ticks = simulator.lock().await.step(clock.now());
    let mut delivered = 0;

    for tick in ticks {
        gateway.set_mark_price(&tick.symbol, tick.price);
        delivered += feed.publish(tick);
    }
    delivered
}

/// Log every executed trade at info level
fn spawn_trade_reporter(mut changes: broadcast::Receiver<BotUpdate>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(update) if update.kind == UpdateKind::Traded => {
                    if let Some(bot) = update.snapshot {
                        log::info!(
                            "[{}] {} | {} | trades={} profit={}",
                            bot.id,
                            bot.symbol,
                            bot.phase(),
                            bot.stats.total_trades,
                            bot.stats.total_profit_quote
                        );
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("Trade reporter skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
