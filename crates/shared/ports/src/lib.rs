//! Scalper Ports
//!
//! Port definitions (traits) for the Scalper bot engine.
//! These define the boundaries between the bot engine and the outside world:
//! where prices come from, where orders go, and where state is kept.

mod clock;
mod error;
mod feed;
mod gateway;
mod store;

pub use clock::Clock;
pub use error::{OrderError, PersistenceError, PersistenceResult};
pub use feed::{PriceFeed, TickSubscription};
pub use gateway::{OrderAck, OrderGateway, OrderRequest};
pub use store::StateStore;
