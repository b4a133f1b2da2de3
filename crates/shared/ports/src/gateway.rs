use async_trait::async_trait;
use scalper_core::{Price, Quantity, Side, Symbol};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Market order submission request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Client-side order id, used to correlate ledger records
    pub client_order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Quantity,
}

impl OrderRequest {
    pub fn market(
        client_order_id: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
    ) -> Self {
        Self {
            client_order_id: client_order_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
        }
    }
}

/// Acknowledgement of a filled market order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Exchange-assigned order id
    pub order_id: String,
    pub client_order_id: String,
    pub filled_qty: Quantity,
    pub avg_price: Option<Price>,
}

/// Port for order submission
///
/// Implementations place a market order and either report the fill or the
/// reason the exchange declined it.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a market order
    async fn submit_market_order(&self, request: &OrderRequest) -> Result<OrderAck, OrderError>;

    /// Gateway name for logging
    fn name(&self) -> &str {
        "OrderGateway"
    }
}
