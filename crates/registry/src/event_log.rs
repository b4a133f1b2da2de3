//! Event log messages
//!
//! Human-readable entries for a bot's event log, one per state change and
//! one per order outcome.

use scalper_core::{LogEntry, LogKind, Timestamp, TradeIntent};
use scalper_ports::{OrderAck, OrderError};
use scalper_strategy::Transition;

/// Log entry for a position state change
pub fn transition_entry(now: Timestamp, transition: &Transition) -> LogEntry {
    match transition {
        Transition::Entered {
            price,
            delta_pct,
            stop_price,
            ..
        } => LogEntry::new(
            now,
            LogKind::Buy,
            format!(
                "BUY: ${:.4} ({:.2}%) | Stop: ${:.4}",
                price, delta_pct, stop_price
            ),
        ),
        Transition::BreakevenActivated { stop_price } => LogEntry::new(
            now,
            LogKind::Info,
            format!("BREAKEVEN active, stop moved to entry: ${:.4}", stop_price),
        ),
        Transition::TrailingActivated { max_price } => LogEntry::new(
            now,
            LogKind::Info,
            format!("TRAILING active, highest: ${:.4}", max_price),
        ),
        Transition::StopRaised {
            from,
            to,
            max_price,
        } => LogEntry::new(
            now,
            LogKind::Info,
            format!(
                "Trailing stop raised: ${:.4} -> ${:.4} | Max: ${:.4}",
                from, to, max_price
            ),
        ),
        Transition::Exited {
            reason,
            price,
            profit_quote,
            profit_pct,
        } => LogEntry::new(
            now,
            LogKind::Sell,
            format!(
                "SELL ({}): ${:.4} | Profit: ${:.2} ({:.2}%)",
                reason, price, profit_quote, profit_pct
            ),
        ),
    }
}

/// Log entry for the gateway's answer to a trade intent
pub fn order_entry(
    now: Timestamp,
    intent: &TradeIntent,
    outcome: &Result<OrderAck, OrderError>,
) -> LogEntry {
    match outcome {
        Ok(ack) => LogEntry::new(
            now,
            LogKind::Info,
            format!(
                "{} order filled: {} @ {} (order {})",
                intent.side,
                ack.filled_qty,
                ack.avg_price
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "market".to_string()),
                ack.order_id
            ),
        ),
        Err(e) => LogEntry::new(
            now,
            LogKind::Error,
            format!("{} order rejected: {}", intent.side, e),
        ),
    }
}
