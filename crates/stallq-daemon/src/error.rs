//! HTTP mapping of service failures.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use stallq_db::OrderError;

use crate::api_types::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    /// Identity headers missing or malformed.
    Unauthenticated(String),
    /// Request body or path parameters failed validation in the handler.
    BadRequest(String),
    Order(OrderError),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub fn status_for(err: &OrderError) -> StatusCode {
    match err {
        OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
        OrderError::InsufficientStock { .. }
        | OrderError::InvalidTransition(_)
        | OrderError::Conflict(_) => StatusCode::CONFLICT,
        OrderError::Unauthorized(_) => StatusCode::FORBIDDEN,
        OrderError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            ApiError::Order(err) => {
                let status = status_for(&err);
                let message = match &err {
                    // Driver errors can carry connection details; keep them in the log only.
                    OrderError::Store(inner) => {
                        tracing::error!(error = %inner, "store failure");
                        "internal store failure".to_string()
                    }
                    other => other.to_string(),
                };
                (status, err.kind(), message)
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: kind.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_errors_map_to_documented_codes() {
        assert_eq!(
            status_for(&OrderError::InsufficientStock {
                product_id: 1,
                requested: 2
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&OrderError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&OrderError::Unauthorized("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&OrderError::InvalidRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&OrderError::Store(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
