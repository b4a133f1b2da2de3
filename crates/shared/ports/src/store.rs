use async_trait::async_trait;
use scalper_core::{Bot, BotId};

use crate::error::PersistenceResult;

/// Port for durable bot snapshots
///
/// A snapshot is the full [`Bot`] record. Writes for different bots are
/// independent of each other.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Write (or overwrite) the snapshot for a bot
    async fn save(&self, id: &BotId, snapshot: &Bot) -> PersistenceResult<()>;

    /// Read one snapshot
    async fn load(&self, id: &BotId) -> PersistenceResult<Option<Bot>>;

    /// Read every stored snapshot
    async fn load_all(&self) -> PersistenceResult<Vec<(BotId, Bot)>>;

    /// Delete a snapshot (no error if absent)
    async fn remove(&self, id: &BotId) -> PersistenceResult<()>;
}
