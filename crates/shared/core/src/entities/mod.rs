mod bot;
mod intent;
mod log_entry;
mod market;
mod position;
mod settings;
mod side;
mod stats;

pub use bot::{Bot, StrategyKind};
pub use intent::{ExitReason, TradeIntent};
pub use log_entry::{LogEntry, LogKind};
pub use market::{PricePoint, Tick};
pub use position::{Phase, Position};
pub use settings::{BotSettings, SettingsInput};
pub use side::Side;
pub use stats::BotStats;
