//! Order gateway adapters
//!
//! - paper: simulated fills against local balances (demo and tests)

pub mod paper;
