//! Scalper Gateway
//!
//! Gateway layer between the bot engine and the market. Provides:
//! - `ChannelPriceFeed`: per-symbol tick fan-out over tokio broadcast channels
//! - `PaperOrderGateway`: market-order fills against simulated balances, with
//!   the same rejection rules as a real spot exchange
//!
//! ## Architecture
//!
//! ```text
//!  Price source (simulator, exchange stream)
//!         │ publish(tick)
//!    ┌────▼─────────────┐
//!    │ ChannelPriceFeed │  one broadcast channel per symbol,
//!    └────┬───────┬─────┘  dropped when its last subscriber leaves
//!         │       │
//!       bot A   bot B ──── submit_market_order ───► PaperOrderGateway
//! ```

pub mod adapters;
pub mod transport;

// Re-export commonly used types
pub use adapters::paper::{PaperGatewayConfig, PaperOrderGateway, SymbolRules};
pub use transport::channel::{ChannelPriceFeed, DEFAULT_CHANNEL_CAPACITY};
