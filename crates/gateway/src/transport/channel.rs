//! Tokio channel-based price feed for single-process mode
//!
//! One broadcast channel per symbol. Subscriptions are counted per symbol and
//! the channel is torn down when the last one is released, so one bot
//! unsubscribing never cuts off another bot on the same symbol.

use dashmap::DashMap;
use scalper_core::{Symbol, Tick};
use scalper_ports::{PriceFeed, TickSubscription};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

/// Ticks buffered per symbol before slow subscribers start lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

struct SymbolChannel {
    tx: broadcast::Sender<Tick>,
    subscribers: usize,
}

struct FeedInner {
    channels: DashMap<Symbol, SymbolChannel>,
    capacity: usize,
}

impl FeedInner {
    fn release(&self, symbol: &str) {
        let last = match self.channels.get_mut(symbol) {
            Some(mut channel) => {
                channel.subscribers = channel.subscribers.saturating_sub(1);
                channel.subscribers == 0
            }
            None => false,
        };

        if last {
            // Someone may have re-subscribed in between
            if self
                .channels
                .remove_if(symbol, |_, channel| channel.subscribers == 0)
                .is_some()
            {
                log::info!("[ChannelPriceFeed] Closed stream for {}", symbol);
            }
        }
    }
}

/// Channel-based [`PriceFeed`] with reference-counted symbol streams
///
/// Cloning shares the same set of channels.
#[derive(Clone)]
pub struct ChannelPriceFeed {
    inner: Arc<FeedInner>,
}

impl ChannelPriceFeed {
    /// Create a feed buffering `capacity` ticks per symbol
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                channels: DashMap::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Publish a tick to every subscriber of its symbol
    ///
    /// Returns how many subscribers received it (0 when nobody listens).
    pub fn publish(&self, tick: Tick) -> usize {
        match self.inner.channels.get(&tick.symbol) {
            Some(channel) => channel.tx.send(tick).unwrap_or(0),
            None => 0,
        }
    }

    /// Symbols with at least one live subscription
    pub fn active_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .inner
            .channels
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        symbols.sort();
        symbols
    }
}

impl Default for ChannelPriceFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl PriceFeed for ChannelPriceFeed {
    fn subscribe(&self, symbol: &str) -> TickSubscription {
        let (rx, count) = {
            let mut channel = self
                .inner
                .channels
                .entry(symbol.to_string())
                .or_insert_with(|| {
                    log::info!("[ChannelPriceFeed] Opened stream for {}", symbol);
                    SymbolChannel {
                        tx: broadcast::channel(self.inner.capacity).0,
                        subscribers: 0,
                    }
                });
            channel.subscribers += 1;
            (channel.tx.subscribe(), channel.subscribers)
        };

        log::debug!(
            "[ChannelPriceFeed] {} subscribers on {}",
            count,
            symbol
        );

        let inner: Weak<FeedInner> = Arc::downgrade(&self.inner);
        let released = symbol.to_string();
        TickSubscription::new(symbol, rx, move || {
            if let Some(inner) = inner.upgrade() {
                inner.release(&released);
            }
        })
    }

    fn subscriber_count(&self, symbol: &str) -> usize {
        self.inner
            .channels
            .get(symbol)
            .map(|channel| channel.subscribers)
            .unwrap_or(0)
    }

    fn name(&self) -> &str {
        "ChannelPriceFeed"
    }
}
