use async_trait::async_trait;
use dashmap::DashMap;
use scalper_core::{Bot, BotId};
use scalper_ports::{PersistenceError, PersistenceResult, StateStore};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// In-memory state store
///
/// Counts writes and can be told to fail them, which makes persistence
/// cadence and failure handling observable in tests.
#[derive(Default)]
pub struct MemoryStateStore {
    snapshots: DashMap<BotId, Bot>,
    saves: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following `save`/`remove` fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn check_writable(&self) -> PersistenceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(io::Error::other("writes disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn save(&self, id: &BotId, snapshot: &Bot) -> PersistenceResult<()> {
        self.check_writable()?;
        self.snapshots.insert(id.clone(), snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, id: &BotId) -> PersistenceResult<Option<Bot>> {
        Ok(self.snapshots.get(id).map(|entry| entry.value().clone()))
    }

    async fn load_all(&self) -> PersistenceResult<Vec<(BotId, Bot)>> {
        let mut all: Vec<(BotId, Bot)> = self
            .snapshots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }

    async fn remove(&self, id: &BotId) -> PersistenceResult<()> {
        self.check_writable()?;
        self.snapshots.remove(id);
        Ok(())
    }
}
