//! Application configuration
//!
//! One JSON document configures the whole process. Every section is optional;
//! missing fields take the defaults below, and a missing file means "all
//! defaults".
//!
//! ```json
//! {
//!   "state_dir": "state",
//!   "feed": { "interval_ms": 500, "seed": 7 },
//!   "bots": [
//!     { "symbol": "BTCUSDT", "settings": { "buy_threshold_pct": -0.4 } }
//!   ]
//! }
//! ```

use crate::error::ConfigError;
use crate::event_feed::SimulatedFeedConfig;
use scalper_core::{SettingsInput, StrategyKind};
use scalper_gateway::PaperGatewayConfig;
use scalper_registry::{LedgerConfig, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var naming the config file when no CLI argument is given
pub const CONFIG_ENV: &str = "SCALPER_CONFIG";

/// Env var overriding `state_dir`
pub const STATE_DIR_ENV: &str = "SCALPER_STATE_DIR";

/// Bot created on first launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSpec {
    pub symbol: String,
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub settings: SettingsInput,
    /// Start right after creation
    #[serde(default = "default_true")]
    pub start: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for bot snapshots and the trade ledger
    pub state_dir: PathBuf,
    pub registry: RegistryConfig,
    /// `path` defaults to `<state_dir>/trade_history.json`
    pub ledger: LedgerConfig,
    pub gateway: PaperGatewayConfig,
    pub feed: SimulatedFeedConfig,
    /// Only used while the state directory holds no bots
    pub bots: Vec<BotSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("state"),
            registry: RegistryConfig::default(),
            ledger: LedgerConfig::default(),
            gateway: PaperGatewayConfig::default(),
            feed: SimulatedFeedConfig::default(),
            bots: vec![BotSpec {
                symbol: "BTCUSDT".to_string(),
                strategy: StrategyKind::Scalping,
                settings: SettingsInput::default(),
                start: true,
            }],
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config from the process arguments and environment
    ///
    /// The first CLI argument wins over `SCALPER_CONFIG`; with neither, the
    /// defaults are used.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .map(PathBuf::from);

        let config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        Ok(config.with_state_dir_override(std::env::var(STATE_DIR_ENV).ok()))
    }

    /// Replace `state_dir` when an override is given
    pub fn with_state_dir_override(mut self, state_dir: Option<String>) -> Self {
        if let Some(dir) = state_dir.filter(|d| !d.trim().is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        self
    }

    /// Directory holding one JSON snapshot per bot
    pub fn bots_dir(&self) -> PathBuf {
        self.state_dir.join("bots")
    }

    /// Ledger settings with the file location filled in
    pub fn ledger_config(&self) -> LedgerConfig {
        let mut ledger = self.ledger.clone();
        if ledger.path.is_none() {
            ledger.path = Some(self.state_dir.join("trade_history.json"));
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.state_dir, PathBuf::from("state"));
        assert_eq!(config.bots_dir(), PathBuf::from("state").join("bots"));
        assert_eq!(
            config.ledger_config().path,
            Some(PathBuf::from("state").join("trade_history.json"))
        );
        assert_eq!(config.registry.persist_every_ticks, 10);
        assert_eq!(config.bots.len(), 1);
        assert!(config.bots[0].start);
    }

    #[test]
    fn test_partial_json() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "state_dir": "/tmp/scalper",
                "registry": { "log_limit": 20 },
                "bots": [
                    { "symbol": "ETHUSDT", "strategy": "grid", "start": false },
                    { "symbol": "BTCUSDT", "settings": { "stop_loss_pct": -1.5 } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.state_dir, PathBuf::from("/tmp/scalper"));
        assert_eq!(config.registry.log_limit, 20);
        assert_eq!(config.registry.price_history_limit, 100);
        assert_eq!(config.bots[0].strategy, StrategyKind::Grid);
        assert!(!config.bots[0].start);
        assert_eq!(config.bots[1].strategy, StrategyKind::Scalping);
        assert_eq!(config.bots[1].settings.stop_loss_pct, Some(-1.5));
        assert!(config.bots[1].start);
    }

    #[test]
    fn test_explicit_ledger_path_is_kept() {
        let mut config = AppConfig::default();
        config.ledger.path = Some(PathBuf::from("/var/lib/ledger.json"));

        assert_eq!(
            config.ledger_config().path,
            Some(PathBuf::from("/var/lib/ledger.json"))
        );
    }

    #[test]
    fn test_state_dir_override() {
        let config = AppConfig::default().with_state_dir_override(Some("/data".to_string()));
        assert_eq!(config.state_dir, PathBuf::from("/data"));

        let config = AppConfig::default().with_state_dir_override(Some("  ".to_string()));
        assert_eq!(config.state_dir, PathBuf::from("state"));
    }

    #[test]
    fn test_load_missing_and_invalid_files() {
        let dir = std::env::temp_dir();

        let missing = dir.join("scalper-config-does-not-exist.json");
        assert_eq!(AppConfig::load(&missing).unwrap().bots.len(), 1);

        let invalid = dir.join(format!("scalper-config-{}.json", std::process::id()));
        std::fs::write(&invalid, b"{ \"bots\": 3 }").unwrap();
        let err = AppConfig::load(&invalid).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = std::fs::remove_file(&invalid);
    }
}
