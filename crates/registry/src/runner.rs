//! Per-bot tick task
//!
//! Each running bot owns one task draining its feed subscription, so ticks
//! for a bot are handled strictly one after another. Every tick is processed
//! in its own child task; if that one fails the bot's log gets an error entry
//! and the runner moves on to the next tick.

use scalper_core::BotId;
use scalper_ports::TickSubscription;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::registry::WeakRegistry;

pub(crate) struct BotRunner {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl BotRunner {
    pub(crate) fn spawn(registry: WeakRegistry, id: BotId, mut subscription: TickSubscription) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            log::info!("[{}] Runner started on {}", id, subscription.symbol());

            loop {
                tokio::select! {
                    biased;

                    _ = &mut stop_rx => break,

                    tick = subscription.recv() => {
                        let Some(tick) = tick else {
                            log::warn!("[{}] Price stream closed", id);
                            break;
                        };
                        let Some(registry) = registry.upgrade() else {
                            break;
                        };

                        let processing = {
                            let registry = registry.clone();
                            let id = id.clone();
                            tokio::spawn(async move { registry.handle_tick(&id, tick).await })
                        };
                        match processing.await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                log::warn!("[{}] Runner ending: {}", id, e);
                                break;
                            }
                            Err(e) => {
                                log::error!("[{}] Tick processing failed: {}", id, e);
                                let reason = if e.is_panic() { "panicked" } else { "cancelled" };
                                registry.report_tick_failure(&id, reason).await;
                            }
                        }
                    }
                }
            }

            subscription.unsubscribe();
            log::info!("[{}] Runner stopped", id);
        });

        Self { stop_tx, handle }
    }

    /// False once the task has ended for any reason
    pub(crate) fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the task and wait until it has handled its last tick
    pub(crate) async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                log::error!("Bot runner panicked: {}", e);
            }
        }
    }

    /// Cancel without waiting
    pub(crate) fn abort(self) {
        self.handle.abort();
    }
}
