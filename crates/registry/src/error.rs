//! Error types for the registry crate

use scalper_core::BotId;
use thiserror::Error;

/// Failures of explicit bot control operations
///
/// Tick processing never produces these; problems there end up in the bot's
/// event log instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Bot not found: {0}")]
    NotFound(BotId),

    #[error("Invalid state for {id}: {reason}")]
    InvalidState { id: BotId, reason: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
