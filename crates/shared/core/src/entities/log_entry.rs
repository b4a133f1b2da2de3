use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// Category of a bot log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Buy,
    Sell,
    Info,
    Error,
}

/// Human-readable, timestamped line of a bot's event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub message: String,
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(timestamp: Timestamp, kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            kind,
        }
    }
}
