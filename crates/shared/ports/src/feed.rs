use scalper_core::Tick;
use tokio::sync::broadcast;

/// Port for live price data
///
/// Feeds fan ticks out to every subscriber of a symbol. Subscriptions are
/// reference counted per symbol: releasing one subscriber never interrupts
/// the others on the same symbol. Reconnection and backoff are the feed's
/// own business; subscribers only ever observe gaps between ticks.
pub trait PriceFeed: Send + Sync {
    /// Subscribe to ticks for `symbol`
    fn subscribe(&self, symbol: &str) -> TickSubscription;

    /// Number of live subscriptions for `symbol`
    fn subscriber_count(&self, symbol: &str) -> usize;

    /// Feed name for logging
    fn name(&self) -> &str {
        "PriceFeed"
    }
}

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Handle to a live tick subscription
///
/// Dropping the handle (or calling [`TickSubscription::unsubscribe`])
/// releases the subscription with the feed.
pub struct TickSubscription {
    symbol: String,
    rx: broadcast::Receiver<Tick>,
    release: Option<ReleaseFn>,
}

impl TickSubscription {
    /// Create a subscription; `release` runs exactly once when it ends
    pub fn new(
        symbol: impl Into<String>,
        rx: broadcast::Receiver<Tick>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            rx,
            release: Some(Box::new(release)),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Wait for the next tick; `None` once the feed has shut the symbol down
    pub async fn recv(&mut self) -> Option<Tick> {
        loop {
            match self.rx.recv().await {
                Ok(tick) => return Some(tick),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Only the latest prices matter; skip what we missed
                    log::warn!("[{}] Subscriber lagged {} ticks", self.symbol, n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take a tick if one is queued
    pub fn try_recv(&mut self) -> Option<Tick> {
        loop {
            match self.rx.try_recv() {
                Ok(tick) => return Some(tick),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Release the subscription now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for TickSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSubscription")
            .field("symbol", &self.symbol)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Ensure the trait is object-safe
    fn _assert_feed_object_safe(_: &dyn PriceFeed) {}

    #[tokio::test]
    async fn test_recv_and_release_on_drop() {
        let (tx, rx) = broadcast::channel(8);
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();

        let mut sub = TickSubscription::new("BTCUSDT", rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tx.send(Tick::new("BTCUSDT", dec!(100), Utc::now())).unwrap();
        let tick = sub.recv().await.unwrap();
        assert_eq!(tick.price, dec!(100));
        assert_eq!(sub.symbol(), "BTCUSDT");

        sub.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let (tx, rx) = broadcast::channel::<Tick>(8);
        let mut sub = TickSubscription::new("ETHUSDT", rx, || {});
        drop(tx);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_to_latest() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = TickSubscription::new("BTCUSDT", rx, || {});

        for i in 1..=5 {
            tx.send(Tick::new("BTCUSDT", rust_decimal::Decimal::from(i), Utc::now()))
                .unwrap();
        }

        let tick = sub.recv().await.unwrap();
        assert_eq!(tick.price, dec!(4));
        assert_eq!(sub.try_recv().unwrap().price, dec!(5));
        assert!(sub.try_recv().is_none());
    }
}
