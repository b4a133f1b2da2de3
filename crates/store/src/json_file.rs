use async_trait::async_trait;
use scalper_core::{Bot, BotId};
use scalper_ports::{PersistenceError, PersistenceResult, StateStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory of JSON bot snapshots
///
/// Each bot lives in `<dir>/<bot id>.json`. Writes go to a temporary file
/// first and are renamed into place, so a crash mid-write leaves the previous
/// snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    dir: PathBuf,
}

impl JsonFileStateStore {
    /// Use `dir`, creating it if needed
    pub async fn open(dir: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        log::info!("[JsonFileStateStore] Using {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &BotId) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(id)))
    }
}

/// Bot ids come from user-supplied symbols; keep file names tame
fn file_stem(id: &BotId) -> String {
    id.as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn parse(key: &str, bytes: &[u8]) -> PersistenceResult<Bot> {
    let mut bot: Bot = serde_json::from_slice(bytes).map_err(|e| PersistenceError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    bot.normalize();
    Ok(bot)
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn save(&self, id: &BotId, snapshot: &Bot) -> PersistenceResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, id: &BotId) -> PersistenceResult<Option<Bot>> {
        match fs::read(self.path_for(id)).await {
            Ok(bytes) => parse(id.as_str(), &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_all(&self) -> PersistenceResult<Vec<(BotId, Bot)>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut bots = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let key = path.display().to_string();
            let parsed = match fs::read(&path).await {
                Ok(bytes) => parse(&key, &bytes),
                Err(e) => Err(e.into()),
            };
            match parsed {
                Ok(bot) => bots.push((bot.id.clone(), bot)),
                Err(e) => log::warn!("[JsonFileStateStore] Skipping {}: {}", key, e),
            }
        }

        bots.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(bots)
    }

    async fn remove(&self, id: &BotId) -> PersistenceResult<()> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
