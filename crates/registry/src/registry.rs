//! Bot Registry - owns the bots and wires them to feed, gateway and store
//!
//! Each bot sits behind its own async mutex. Tick handling commits the
//! strategy's state change under that lock, releases it while the order is
//! in flight, then re-locks to record the outcome and persist.
//!
//! Lock order is `lifecycle -> bot`; map guards are never held across an
//! await.

use dashmap::DashMap;
use rust_decimal::Decimal;
use scalper_core::{
    Bot, BotId, BotSettings, LogEntry, LogKind, PricePoint, SettingsInput, StrategyKind, Tick,
    TradeIntent,
};
use scalper_ports::{Clock, OrderGateway, OrderRequest, PriceFeed, StateStore};
use scalper_strategy::{Evaluation, PriceStep, StrategyContext, for_kind};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::event_log;
use crate::export::HistoryExport;
use crate::ledger::{BotEventKind, TradeAttempt, TradeLedger};
use crate::runner::BotRunner;
use crate::update::{BotUpdate, UpdateKind};

/// Mutable per-bot state
struct BotCell {
    bot: Bot,
    ticks_since_persist: u32,
    /// A run of consecutive strategy failures is reported once
    strategy_error_reported: bool,
}

struct BotSlot {
    cell: Arc<Mutex<BotCell>>,
    /// Serializes start/stop/delete/edit for one bot
    lifecycle: Arc<Mutex<()>>,
    runner: Option<BotRunner>,
}

struct RegistryInner {
    feed: Arc<dyn PriceFeed>,
    gateway: Arc<dyn OrderGateway>,
    store: Arc<dyn StateStore>,
    ledger: Arc<TradeLedger>,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
    bots: DashMap<BotId, BotSlot>,
    changes: broadcast::Sender<BotUpdate>,
}

/// Order produced by a tick, waiting for the gateway
struct PendingOrder {
    intent: TradeIntent,
    request: OrderRequest,
    attempt: TradeAttempt,
}

/// Registry of trading bots
///
/// Cheap to clone; clones share the same bots.
#[derive(Clone)]
pub struct BotRegistry {
    inner: Arc<RegistryInner>,
}

/// Non-owning handle held by bot runners
#[derive(Clone)]
pub(crate) struct WeakRegistry(Weak<RegistryInner>);

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<BotRegistry> {
        self.0.upgrade().map(|inner| BotRegistry { inner })
    }
}

/// Upper-case, trimmed symbol
fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl BotRegistry {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        gateway: Arc<dyn OrderGateway>,
        store: Arc<dyn StateStore>,
        ledger: Arc<TradeLedger>,
        clock: Arc<dyn Clock>,
        config: RegistryConfig,
    ) -> Self {
        let (changes, _) = broadcast::channel(config.change_feed_capacity.max(1));

        log::info!(
            "[BotRegistry] Using feed={}, gateway={}, clock={}",
            feed.name(),
            gateway.name(),
            clock.name()
        );

        Self {
            inner: Arc::new(RegistryInner {
                feed,
                gateway,
                store,
                ledger,
                clock,
                config,
                bots: DashMap::new(),
                changes,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Arc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    pub fn ledger(&self) -> &Arc<TradeLedger> {
        &self.inner.ledger
    }

    /// Receive a notification for every change to any bot
    pub fn subscribe_changes(&self) -> broadcast::Receiver<BotUpdate> {
        self.inner.changes.subscribe()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    fn cell(&self, id: &BotId) -> Result<Arc<Mutex<BotCell>>> {
        self.inner
            .bots
            .get(id)
            .map(|slot| Arc::clone(&slot.cell))
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    fn handles(&self, id: &BotId) -> Result<(Arc<Mutex<BotCell>>, Arc<Mutex<()>>)> {
        self.inner
            .bots
            .get(id)
            .map(|slot| (Arc::clone(&slot.cell), Arc::clone(&slot.lifecycle)))
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// True while the bot's tick task is alive
    fn has_runner(&self, id: &BotId) -> bool {
        self.inner
            .bots
            .get(id)
            .map(|slot| slot.runner.as_ref().is_some_and(BotRunner::is_alive))
            .unwrap_or(false)
    }

    fn take_runner(&self, id: &BotId) -> Option<BotRunner> {
        self.inner
            .bots
            .get_mut(id)
            .and_then(|mut slot| slot.runner.take())
    }

    /// Subscribe `id` to its symbol and spawn its tick task
    fn attach_runner(&self, id: &BotId, symbol: &str) {
        let subscription = self.inner.feed.subscribe(symbol);
        let runner = BotRunner::spawn(self.downgrade(), id.clone(), subscription);

        match self.inner.bots.get_mut(id) {
            Some(mut slot) => {
                if let Some(previous) = slot.runner.replace(runner) {
                    previous.abort();
                }
            }
            None => runner.abort(),
        }
    }

    /// Snapshot of one bot
    pub async fn get_bot(&self, id: &BotId) -> Option<Bot> {
        let cell = self.cell(id).ok()?;
        let state = cell.lock().await;
        Some(state.bot.clone())
    }

    /// Snapshots of every bot, oldest first
    pub async fn get_all_bots(&self) -> Vec<Bot> {
        let cells: Vec<Arc<Mutex<BotCell>>> = self
            .inner
            .bots
            .iter()
            .map(|slot| Arc::clone(&slot.cell))
            .collect();

        let mut bots = Vec::with_capacity(cells.len());
        for cell in cells {
            bots.push(cell.lock().await.bot.clone());
        }
        bots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        bots
    }

    pub fn len(&self) -> usize {
        self.inner.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bots.is_empty()
    }

    /// Bots with a live tick task
    pub fn running_count(&self) -> usize {
        self.inner
            .bots
            .iter()
            .filter(|slot| slot.runner.as_ref().is_some_and(BotRunner::is_alive))
            .count()
    }

    // ========================================================================
    // Persistence and notifications
    // ========================================================================

    /// Save a bot snapshot; failures are logged, memory stays authoritative
    async fn persist(&self, state: &mut BotCell) {
        state.ticks_since_persist = 0;
        state.bot.last_saved = Some(self.inner.clock.now());

        if let Err(e) = self.inner.store.save(&state.bot.id, &state.bot).await {
            log::warn!("[{}] Failed to save state: {}", state.bot.id, e);
        }
    }

    fn publish(&self, bot_id: &BotId, kind: UpdateKind, snapshot: Option<Bot>) {
        // No receivers is fine
        let _ = self.inner.changes.send(BotUpdate {
            bot_id: bot_id.clone(),
            kind,
            snapshot,
        });
    }

    fn push_log(&self, bot: &mut Bot, kind: LogKind, message: impl Into<String>) {
        let entry = LogEntry::new(self.inner.clock.now(), kind, message);
        bot.push_log(entry, self.inner.config.log_limit);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a stopped bot; settings are defaulted and clamped, never rejected
    pub async fn create_bot(
        &self,
        symbol: &str,
        strategy: StrategyKind,
        settings: &SettingsInput,
    ) -> BotId {
        let symbol = normalize_symbol(symbol);
        let id = BotId::generate(&symbol);
        let settings = BotSettings::from_input(settings);

        let mut state = BotCell {
            bot: Bot::new(id.clone(), symbol, strategy, settings, self.inner.clock.now()),
            ticks_since_persist: 0,
            strategy_error_reported: false,
        };
        let message = format!("Bot created: {} - {}", state.bot.symbol, strategy);
        self.push_log(&mut state.bot, LogKind::Info, message);
        self.persist(&mut state).await;

        let snapshot = state.bot.clone();
        self.inner.bots.insert(
            id.clone(),
            BotSlot {
                cell: Arc::new(Mutex::new(state)),
                lifecycle: Arc::new(Mutex::new(())),
                runner: None,
            },
        );

        log::info!("[{}] Created {} bot on {}", id, strategy, snapshot.symbol);
        self.publish(&id, UpdateKind::Created, Some(snapshot));
        id
    }

    /// Start a bot; starting a running bot does nothing
    pub async fn start_bot(&self, id: &BotId) -> Result<()> {
        let (cell, lifecycle) = self.handles(id)?;
        let _lifecycle = lifecycle.lock().await;

        let (symbol, snapshot) = {
            let mut state = cell.lock().await;

            if state.bot.is_running {
                if self.has_runner(id) {
                    log::debug!("[{}] Already running", id);
                    return Ok(());
                }
                // Marked running without a live task: resume, reporting a dead one
                if let Some(dead) = self.take_runner(id) {
                    dead.stop().await;
                    log::error!("[{}] Tick task had ended, restarting it", id);
                    self.push_log(
                        &mut state.bot,
                        LogKind::Error,
                        "Tick processing had stopped; restarted",
                    );
                }
                (state.bot.symbol.clone(), None)
            } else {
                let now = self.inner.clock.now();
                state.bot.is_running = true;
                if state.bot.stats.start_time.is_none() {
                    state.bot.stats.start_time = Some(now);
                }
                state.strategy_error_reported = false;
                let message = format!("Bot started on {}", state.bot.symbol);
                self.push_log(&mut state.bot, LogKind::Info, message);
                self.inner
                    .ledger
                    .record_bot_event(now, BotEventKind::BotStart, &state.bot);
                self.persist(&mut state).await;
                (state.bot.symbol.clone(), Some(state.bot.clone()))
            }
        };

        self.attach_runner(id, &symbol);
        log::info!("[{}] Started on {}", id, symbol);

        if let Some(snapshot) = snapshot {
            self.inner.ledger.persist().await;
            self.publish(id, UpdateKind::Started, Some(snapshot));
        }
        Ok(())
    }

    /// Stop a bot; an open position stays open until the bot runs again
    pub async fn stop_bot(&self, id: &BotId) -> Result<()> {
        let (cell, lifecycle) = self.handles(id)?;
        let _lifecycle = lifecycle.lock().await;

        if let Some(runner) = self.take_runner(id) {
            runner.stop().await;
        }

        let snapshot = {
            let mut state = cell.lock().await;
            if !state.bot.is_running {
                return Ok(());
            }
            state.bot.is_running = false;
            self.push_log(&mut state.bot, LogKind::Info, "Bot stopped");
            self.inner
                .ledger
                .record_bot_event(self.inner.clock.now(), BotEventKind::BotStop, &state.bot);
            self.persist(&mut state).await;
            state.bot.clone()
        };

        log::info!("[{}] Stopped", id);
        self.inner.ledger.persist().await;
        self.publish(id, UpdateKind::Stopped, Some(snapshot));
        Ok(())
    }

    /// Stop (if needed) and forget a bot, including its stored snapshot
    pub async fn delete_bot(&self, id: &BotId) -> Result<()> {
        let (cell, lifecycle) = self.handles(id)?;
        let _lifecycle = lifecycle.lock().await;

        if let Some(runner) = self.take_runner(id) {
            runner.stop().await;
        }

        {
            let mut state = cell.lock().await;
            if state.bot.is_running {
                state.bot.is_running = false;
                self.inner.ledger.record_bot_event(
                    self.inner.clock.now(),
                    BotEventKind::BotStop,
                    &state.bot,
                );
            }
        }

        self.inner.bots.remove(id);
        if let Err(e) = self.inner.store.remove(id).await {
            log::warn!("[{}] Failed to remove stored state: {}", id, e);
        }

        log::info!("[{}] Deleted", id);
        self.inner.ledger.persist().await;
        self.publish(id, UpdateKind::Deleted, None);
        Ok(())
    }

    /// Move a stopped, flat bot to another symbol
    pub async fn update_symbol(&self, id: &BotId, symbol: &str) -> Result<()> {
        let (cell, lifecycle) = self.handles(id)?;
        let _lifecycle = lifecycle.lock().await;

        let snapshot = {
            let mut state = cell.lock().await;
            if state.bot.is_running {
                return Err(RegistryError::InvalidState {
                    id: id.clone(),
                    reason: "symbol can only change while stopped".to_string(),
                });
            }
            if state.bot.position.is_some() {
                return Err(RegistryError::InvalidState {
                    id: id.clone(),
                    reason: "symbol cannot change with an open position".to_string(),
                });
            }

            let symbol = normalize_symbol(symbol);
            if symbol == state.bot.symbol {
                return Ok(());
            }

            let message = format!("Symbol changed: {} -> {}", state.bot.symbol, symbol);
            state.bot.symbol = symbol;
            // Deltas across two instruments are meaningless
            state.bot.price_history.clear();
            self.push_log(&mut state.bot, LogKind::Info, message);
            self.persist(&mut state).await;
            state.bot.clone()
        };

        self.publish(id, UpdateKind::Updated, Some(snapshot));
        Ok(())
    }

    /// Replace the settings of a stopped bot, returning what was applied
    pub async fn update_settings(&self, id: &BotId, input: &SettingsInput) -> Result<BotSettings> {
        let (cell, lifecycle) = self.handles(id)?;
        let _lifecycle = lifecycle.lock().await;

        let (settings, snapshot) = {
            let mut state = cell.lock().await;
            if state.bot.is_running {
                return Err(RegistryError::InvalidState {
                    id: id.clone(),
                    reason: "settings can only change while stopped".to_string(),
                });
            }

            let settings = BotSettings::from_input(input);
            state.bot.settings = settings;
            self.push_log(&mut state.bot, LogKind::Info, "Settings updated");
            self.persist(&mut state).await;
            (settings, state.bot.clone())
        };

        self.publish(id, UpdateKind::Updated, Some(snapshot));
        Ok(settings)
    }

    /// Load stored bots; running ones are resubscribed
    ///
    /// Bots already in the registry are left alone. Returns how many bots
    /// were resumed.
    pub async fn restore(&self) -> scalper_ports::PersistenceResult<usize> {
        let stored = self.inner.store.load_all().await?;
        let mut resumed = 0;

        for (id, mut bot) in stored {
            if self.inner.bots.contains_key(&id) {
                continue;
            }
            if bot.normalize() {
                log::warn!("[{}] Dropped idle position from snapshot", id);
            }

            let running = bot.is_running;
            let symbol = bot.symbol.clone();
            let phase = bot.phase();
            let snapshot = bot.clone();

            self.inner.bots.insert(
                id.clone(),
                BotSlot {
                    cell: Arc::new(Mutex::new(BotCell {
                        bot,
                        ticks_since_persist: 0,
                        strategy_error_reported: false,
                    })),
                    lifecycle: Arc::new(Mutex::new(())),
                    runner: None,
                },
            );

            if running {
                self.attach_runner(&id, &symbol);
                resumed += 1;
                log::info!("[{}] Resumed on {} in phase {}", id, symbol, phase);
            } else {
                log::info!("[{}] Loaded (stopped)", id);
            }
            self.publish(&id, UpdateKind::Created, Some(snapshot));
        }

        Ok(resumed)
    }

    /// Stop every tick task and save every bot, leaving `is_running` untouched
    ///
    /// Bots that were running resume on the next [`BotRegistry::restore`].
    pub async fn shutdown(&self) {
        let ids: Vec<BotId> = self.inner.bots.iter().map(|slot| slot.key().clone()).collect();

        for id in ids {
            if let Some(runner) = self.take_runner(&id) {
                runner.stop().await;
            }
            if let Ok(cell) = self.cell(&id) {
                let mut state = cell.lock().await;
                self.persist(&mut state).await;
            }
        }

        self.inner.ledger.persist().await;
        log::info!("[BotRegistry] Shut down");
    }

    /// Full history of one bot
    pub async fn export_history(&self, id: &BotId) -> Result<HistoryExport> {
        let cell = self.cell(id)?;
        let state = cell.lock().await;
        Ok(HistoryExport::from_bot(&state.bot, self.inner.clock.now()))
    }

    // ========================================================================
    // Tick processing
    // ========================================================================

    /// Run the strategy on the latest price step, reporting failures in the log
    fn evaluate(&self, state: &mut BotCell, step: &PriceStep) -> Evaluation {
        let strategy = for_kind(state.bot.strategy);
        let bot = &mut state.bot;
        let mut ctx = StrategyContext::new(&bot.settings, &mut bot.position, &mut bot.stats);

        match strategy.on_tick(step, &mut ctx) {
            Ok(evaluation) => {
                state.strategy_error_reported = false;
                evaluation
            }
            Err(e) => {
                if !state.strategy_error_reported {
                    state.strategy_error_reported = true;
                    log::warn!("[{}] {}", state.bot.id, e);
                    self.push_log(&mut state.bot, LogKind::Error, e.to_string());
                }
                Evaluation::none()
            }
        }
    }

    /// Process one price tick for one bot
    ///
    /// Ticks for stopped bots and for other symbols are ignored. Order
    /// rejections and store failures end up in the bot's log, never here.
    pub async fn handle_tick(&self, id: &BotId, tick: Tick) -> Result<()> {
        let cell = self.cell(id)?;
        let now = self.inner.clock.now();

        let mut state = cell.lock().await;
        if !state.bot.is_running {
            log::debug!("[{}] Ignoring tick while stopped", id);
            return Ok(());
        }
        if tick.symbol != state.bot.symbol {
            log::debug!("[{}] Ignoring tick for {}", id, tick.symbol);
            return Ok(());
        }
        if tick.price <= Decimal::ZERO {
            log::warn!("[{}] Ignoring non-positive price {}", id, tick.price);
            return Ok(());
        }

        state
            .bot
            .record_price(PricePoint::from(&tick), self.inner.config.price_history_limit);
        state.ticks_since_persist += 1;

        let evaluation = match state.bot.previous_price() {
            Some(previous) => {
                let step = PriceStep::new(tick.price, previous, tick.timestamp);
                self.evaluate(&mut state, &step)
            }
            None => Evaluation::none(),
        };

        let changed = evaluation.changed_state();
        for transition in &evaluation.transitions {
            let entry = event_log::transition_entry(now, transition);
            log::info!("[{}] {}", id, entry.message);
            state.bot.push_log(entry, self.inner.config.log_limit);
        }

        let pending = evaluation.intent.map(|intent| {
            let bot = &state.bot;
            let client_order_id =
                format!("{}-{}", bot.id, &Uuid::new_v4().simple().to_string()[..8]);
            PendingOrder {
                request: OrderRequest::market(
                    client_order_id,
                    bot.symbol.clone(),
                    intent.side,
                    intent.quantity,
                ),
                attempt: TradeAttempt {
                    bot_id: bot.id.clone(),
                    symbol: bot.symbol.clone(),
                    side: intent.side,
                    price: intent.price,
                    quantity: intent.quantity,
                    amount: intent.amount_quote,
                    profit: intent.profit_quote,
                    reason: intent.reason,
                    strategy: bot.strategy,
                    settings: bot.settings,
                },
                intent,
            }
        });

        let traded = pending.is_some();
        if let Some(order) = pending {
            // The transition is already committed; the order does not roll it back
            drop(state);
            let outcome = self.inner.gateway.submit_market_order(&order.request).await;
            state = cell.lock().await;

            let done = self.inner.clock.now();
            let entry = event_log::order_entry(done, &order.intent, &outcome);
            match &outcome {
                Ok(_) => log::info!("[{}] {}", id, entry.message),
                Err(e) => {
                    log::warn!("[{}] {}", id, entry.message);
                    self.inner.ledger.record_error(
                        done,
                        Some(id),
                        Some(order.request.symbol.as_str()),
                        e.to_string(),
                    );
                }
            }
            state.bot.push_log(entry, self.inner.config.log_limit);

            let ledger_outcome = outcome
                .map(|ack| ack.order_id)
                .map_err(|e| e.to_string());
            self.inner
                .ledger
                .record_trade(done, order.attempt, ledger_outcome);
        }

        let snapshot = {
            let due = state.ticks_since_persist >= self.inner.config.persist_every_ticks;
            if traded || changed || due {
                self.persist(&mut state).await;
            }
            state.bot.clone()
        };
        drop(state);

        if traded {
            self.inner.ledger.persist().await;
            self.publish(id, UpdateKind::Traded, Some(snapshot));
        } else {
            self.publish(id, UpdateKind::Ticked, Some(snapshot));
        }
        Ok(())
    }

    /// Note in the bot's log that processing one tick failed outright
    pub(crate) async fn report_tick_failure(&self, id: &BotId, reason: &str) {
        let Ok(cell) = self.cell(id) else {
            return;
        };
        let snapshot = {
            let mut state = cell.lock().await;
            let message = format!("Tick processing failed: {}", reason);
            self.push_log(&mut state.bot, LogKind::Error, message);
            self.persist(&mut state).await;
            state.bot.clone()
        };
        self.publish(id, UpdateKind::Updated, Some(snapshot));
    }
}
