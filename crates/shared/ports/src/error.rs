use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons an order gateway declines a trade
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Quantity {quantity} below minimum {min} for {symbol}")]
    BelowMinQuantity {
        symbol: String,
        quantity: Decimal,
        min: Decimal,
    },

    #[error("Notional {notional} below minimum {min} for {symbol}")]
    BelowMinNotional {
        symbol: String,
        notional: Decimal,
        min: Decimal,
    },

    #[error("Insufficient {asset} balance: required={required}, available={available}")]
    InsufficientBalance {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Order size out of range for {0}")]
    SizeOutOfRange(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Gateway unavailable: {0}")]
    Transport(String),
}

/// Failures of the state store
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Corrupt snapshot {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
