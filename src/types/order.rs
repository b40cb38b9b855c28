//! Normalized order placement and position types.
//!
//! Order routing is venue-specific and lives outside this crate; what ships
//! here is the normalized vocabulary every venue implementation translates to
//! and from, plus the [`OrderGateway`] trait a venue module implements. Callers
//! size and hedge against the synchronized books and submit through this
//! boundary without caring which venue is behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Price, Qty, TimestampMs};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy the base asset
    Buy,
    /// Sell the base asset
    Sell,
}

impl OrderSide {
    /// Get the opposite side
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Limit order - specify price and quantity
    #[default]
    Limit,
    /// Market order - execute at best available price
    Market,
}

/// Order status, normalized across venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted, resting on the book
    Open,
    /// Fully executed
    Filled,
    /// Canceled before completion
    Canceled,
    /// Rejected by the venue
    Rejected,
}

/// Request to place a new order, in venue-neutral terms
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,

    /// Client-generated order ID (optional, for idempotency)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,

    /// Order side
    pub side: OrderSide,

    /// Order type (limit or market)
    #[serde(rename = "type")]
    pub order_type: OrderType,

    /// Limit price (required for limit orders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,

    /// Order quantity
    pub qty: Qty,

    /// Reduce-only flag for derivative venues
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Create a new limit order request
    pub fn limit(symbol: impl Into<String>, side: OrderSide, price: Price, qty: Qty) -> Self {
        Self {
            symbol: symbol.into(),
            client_order_id: None,
            side,
            order_type: OrderType::Limit,
            price: Some(price),
            qty,
            reduce_only: false,
        }
    }

    /// Create a new market order request
    pub fn market(symbol: impl Into<String>, side: OrderSide, qty: Qty) -> Self {
        Self {
            symbol: symbol.into(),
            client_order_id: None,
            side,
            order_type: OrderType::Market,
            price: None,
            qty,
            reduce_only: false,
        }
    }

    /// Set a client order ID for idempotency
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Mark the order reduce-only
    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }
}

/// Venue acknowledgement of a placed or canceled order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    /// Venue-generated order ID
    pub order_id: String,
    /// Client-generated order ID (if provided)
    pub client_order_id: Option<String>,
    /// Current status
    pub status: OrderStatus,
    /// Quantity filled so far
    pub filled_qty: Qty,
}

/// An open position on a derivative venue
#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    /// Symbol of the position
    pub symbol: String,
    /// Signed position size (negative = short)
    pub size: f64,
    /// Average entry price
    pub entry_price: Price,
    /// Liquidation price, where the venue reports one
    pub liquidation_price: Option<Price>,
    /// Venue timestamp of the report
    pub updated_ts_ms: TimestampMs,
}

/// Venue-side order execution boundary.
///
/// One implementation per venue, owned by the embedder. This crate only
/// defines the surface; the per-venue signing, endpoints, and wire formats
/// stay in the venue modules.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a normalized order
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, Error>;

    /// Cancel an order by venue order id
    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<OrderAck, Error>;

    /// Fetch current open positions
    async fn positions(&self) -> Result<Vec<Position>, Error>;
}
