//! Strategy errors

use scalper_core::{Price, StrategyKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Strategy '{0}' is not implemented")]
    NotImplemented(StrategyKind),

    /// Position math at this price does not fit a Decimal
    #[error("Price {0} is out of range for the position math")]
    Overflow(Price),
}

pub type Result<T> = std::result::Result<T, StrategyError>;
