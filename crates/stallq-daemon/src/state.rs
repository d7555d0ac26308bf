//! Shared runtime state for stallq-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. There is no in-process
//! mutable queue state: everything a handler needs lives in Postgres, reached
//! through the order service's pool.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use stallq_config::OrderPolicy;
use stallq_db::OrderService;

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub orders: OrderService,
    /// Hash of the canonical effective config this process booted with.
    pub config_hash: String,
}

impl AppState {
    pub fn new(pool: PgPool, policy: OrderPolicy, config_hash: String) -> Self {
        Self {
            build: BuildInfo {
                service: "stallq-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            orders: OrderService::new(pool, policy),
            config_hash,
        }
    }

    pub fn pool(&self) -> &PgPool {
        self.orders.pool()
    }
}
