//! Axum router and all HTTP handlers for stallq-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers stay thin: parse, call the order service or a
//! catalog/queue read, map the result.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use stallq_db::{catalog, queue, tokens};
use stallq_schemas::{OrderId, OrderStatus, StallId};
use tracing::info;

use crate::{
    api_types::{
        CurrentTokenResponse, HealthResponse, PlaceOrderRequest, PlaceOrderResponse,
        ProductsResponse, QueueResponse, StallsResponse, StatusChangeRequest,
        StatusChangeResponse,
    },
    error::ApiError,
    extract::{ApiJson, ApiPath},
    identity::Identity,
    state::AppState,
};

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stalls", get(list_stalls))
        .route("/v1/stalls/:stall_id/products", get(stall_products))
        .route("/v1/stalls/:stall_id/current_token", get(current_token))
        .route("/v1/orders", post(place_order))
        .route("/v1/orders/:order_id/cancel", post(cancel_order))
        .route("/v1/orders/:order_id/status", post(change_status))
        .route("/v1/owner/orders", get(owner_orders))
        .route("/v1/owner/products", get(owner_products))
        .route("/v1/customer/orders", get(customer_orders))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Catalog reads (no identity required)
// ---------------------------------------------------------------------------

pub(crate) async fn list_stalls(State(st): State<Arc<AppState>>) -> ApiResult<Json<StallsResponse>> {
    let stalls = catalog::list_stalls(st.pool()).await?;
    Ok(Json(StallsResponse { stalls }))
}

pub(crate) async fn stall_products(
    State(st): State<Arc<AppState>>,
    ApiPath(stall_id): ApiPath<StallId>,
) -> ApiResult<Json<ProductsResponse>> {
    let products = catalog::list_stall_products(st.pool(), stall_id).await?;
    Ok(Json(ProductsResponse { products }))
}

pub(crate) async fn current_token(
    State(st): State<Arc<AppState>>,
    ApiPath(stall_id): ApiPath<StallId>,
) -> ApiResult<Json<CurrentTokenResponse>> {
    let token = tokens::current_token(st.pool(), stall_id).await?;
    Ok(Json(CurrentTokenResponse { stall_id, token }))
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn place_order(
    State(st): State<Arc<AppState>>,
    Identity(caller): Identity,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<PlaceOrderResponse>)> {
    let placed = st
        .orders
        .place_order(&caller, req.product_id, req.quantity)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            success: true,
            order_id: placed.order_id,
            stall_id: placed.stall_id,
            token: placed.token,
            price: placed.price,
        }),
    ))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:order_id/cancel
// ---------------------------------------------------------------------------

pub(crate) async fn cancel_order(
    State(st): State<Arc<AppState>>,
    Identity(caller): Identity,
    ApiPath(order_id): ApiPath<OrderId>,
) -> ApiResult<Json<StatusChangeResponse>> {
    let t = st.orders.cancel_order(&caller, order_id).await?;
    info!(order_id, "orders/cancel");
    Ok(Json(StatusChangeResponse {
        success: true,
        order_id,
        previous: t.from,
        status: t.to,
    }))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:order_id/status
// ---------------------------------------------------------------------------

pub(crate) async fn change_status(
    State(st): State<Arc<AppState>>,
    Identity(caller): Identity,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<StatusChangeRequest>,
) -> ApiResult<Json<StatusChangeResponse>> {
    let target: OrderStatus = req
        .status
        .parse()
        .map_err(|e: stallq_schemas::UnknownStatus| ApiError::BadRequest(e.to_string()))?;

    let t = st.orders.transition_order(&caller, order_id, target).await?;
    info!(order_id, status = %t.to, "orders/status");
    Ok(Json(StatusChangeResponse {
        success: true,
        order_id,
        previous: t.from,
        status: t.to,
    }))
}

// ---------------------------------------------------------------------------
// Queue views
// ---------------------------------------------------------------------------

pub(crate) async fn owner_orders(
    State(st): State<Arc<AppState>>,
    Identity(caller): Identity,
) -> ApiResult<Json<QueueResponse>> {
    let as_of = Utc::now();
    let orders = queue::owner_queue(st.pool(), &caller, as_of).await?;
    Ok(Json(QueueResponse { as_of, orders }))
}

pub(crate) async fn customer_orders(
    State(st): State<Arc<AppState>>,
    Identity(caller): Identity,
) -> ApiResult<Json<QueueResponse>> {
    let as_of = Utc::now();
    let orders = queue::customer_orders(st.pool(), &caller, as_of).await?;
    Ok(Json(QueueResponse { as_of, orders }))
}

pub(crate) async fn owner_products(
    State(st): State<Arc<AppState>>,
    Identity(caller): Identity,
) -> ApiResult<Json<ProductsResponse>> {
    if caller.role() != stallq_schemas::Role::Owner {
        return Err(stallq_db::OrderError::Unauthorized(
            "only an owner may view the stall catalog".to_string(),
        )
        .into());
    }
    let products = catalog::owner_products(st.pool(), caller.user_id()).await?;
    Ok(Json(ProductsResponse { products }))
}
