//! Change feed notifications

use scalper_core::{Bot, BotId};
use serde::Serialize;

/// What happened to a bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Created,
    Started,
    Stopped,
    Deleted,
    /// Symbol or settings edited
    Updated,
    /// An order was attempted
    Traded,
    /// A tick was processed
    Ticked,
}

/// Notification published on the registry's change feed
#[derive(Debug, Clone, Serialize)]
pub struct BotUpdate {
    pub bot_id: BotId,
    pub kind: UpdateKind,
    /// State after the change; `None` once deleted
    pub snapshot: Option<Bot>,
}
