//! Scalper State Stores
//!
//! Implementations of the [`StateStore`](scalper_ports::StateStore) port:
//! - `MemoryStateStore`: process-local, for tests and throwaway runs
//! - `JsonFileStateStore`: one pretty-printed `<bot id>.json` per bot

mod json_file;
mod memory;

pub use json_file::JsonFileStateStore;
pub use memory::MemoryStateStore;
