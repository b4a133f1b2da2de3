//! Tick transport
//!
//! Currently tokio channels for single-process operation. Anything that can
//! hand out a [`scalper_ports::TickSubscription`] can stand in for it.

pub mod channel;
