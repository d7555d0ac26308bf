//! Request and response types for all stallq-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests.  No business logic lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stallq_schemas::{OrderId, OrderStatus, Product, ProductId, ProjectedOrder, Stall, StallId};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub config_hash: String,
}

// ---------------------------------------------------------------------------
// Failure body
// ---------------------------------------------------------------------------

/// Every non-2xx response carries this body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Stable kind: not_found | insufficient_stock | invalid_transition |
    /// unauthorized | conflict | invalid_request | store | unauthenticated
    pub error: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StallsResponse {
    pub stalls: Vec<Stall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTokenResponse {
    pub stall_id: StallId,
    /// Highest token issued so far; 0 before the first order.
    pub token: i64,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub stall_id: StallId,
    pub token: i64,
    pub price: i64,
}

/// Owner status change. `status` is parsed by the handler so an unknown
/// value is a 400 with the usual error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub previous: OrderStatus,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    /// Instant the ETA annotations were computed against.
    pub as_of: DateTime<Utc>,
    pub orders: Vec<ProjectedOrder>,
}
