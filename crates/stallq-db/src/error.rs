//! Failure taxonomy of the order service.
//!
//! Every variant is returned only after the surrounding transaction has been
//! rolled back (or never opened), so no partial effect is ever observable.

use stallq_queue::TransitionError;

/// Name of the `(stall_id, token)` uniqueness constraint in the schema.
pub const TOKEN_CONSTRAINT: &str = "uq_orders_stall_token";

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Referenced product or order does not exist (or is inactive).
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    /// The inventory reservation could not be satisfied.
    #[error("insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: i64, requested: i64 },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// The caller's role or identity does not match the resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A uniqueness constraint fired at write time: a concurrent writer won.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request-level precondition failed before any transaction was opened.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Database driver or connectivity failure.
    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

impl OrderError {
    /// Stable machine-readable kind, used on the wire and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "not_found",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::InvalidTransition(_) => "invalid_transition",
            OrderError::Unauthorized(_) => "unauthorized",
            OrderError::Conflict(_) => "conflict",
            OrderError::InvalidRequest(_) => "invalid_request",
            OrderError::Store(_) => "store",
        }
    }

    pub(crate) fn not_found(what: &'static str, id: i64) -> Self {
        OrderError::NotFound { what, id }
    }

    /// Map a driver error, turning a token uniqueness violation into `Conflict`.
    pub fn from_write(err: sqlx::Error) -> Self {
        if is_unique_violation(&err, TOKEN_CONSTRAINT) {
            return OrderError::Conflict("token already issued for this stall".to_string());
        }
        OrderError::Store(err)
    }
}

/// Detect a Postgres unique constraint violation (SQLSTATE 23505) by name.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stallq_queue::Actor;
    use stallq_schemas::OrderStatus;

    #[test]
    fn kinds_are_stable() {
        let t = TransitionError {
            from: OrderStatus::Pending,
            requested: OrderStatus::Ready,
            actor: Actor::Owner,
        };
        assert_eq!(OrderError::from(t).kind(), "invalid_transition");
        assert_eq!(OrderError::not_found("order", 9).kind(), "not_found");
        assert_eq!(OrderError::not_found("order", 9).to_string(), "order 9 not found");
    }

    #[test]
    fn non_database_errors_are_store_failures() {
        let err = OrderError::from_write(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), "store");
    }
}
