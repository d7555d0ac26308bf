//! Caller identity from the auth layer's forwarded headers.
//!
//! The daemon sits behind an authenticating proxy which sets `x-user-id` and
//! `x-user-role`. Nothing here checks credentials.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use stallq_schemas::Caller;

use crate::error::ApiError;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_ROLE: &str = "x-user-role";

/// Extractor for handlers that act on behalf of a user.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Caller);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))?;
    value
        .to_str()
        .map_err(|_| ApiError::Unauthenticated(format!("{name} header is not valid text")))
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, HEADER_USER_ID)?;
        let role = header(parts, HEADER_USER_ROLE)?;
        let caller =
            Caller::parse(user_id, role).map_err(|e| ApiError::Unauthenticated(e.to_string()))?;
        Ok(Identity(caller))
    }
}
