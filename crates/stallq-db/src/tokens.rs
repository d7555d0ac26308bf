//! Per-stall token sequence.
//!
//! Tokens are `1, 2, 3, ...` per stall, never reused. Allocation happens
//! inside the placing transaction while the stall row is locked, so two
//! placements for the same stall are serialized and observe each other's
//! committed tokens. The `(stall_id, token)` unique constraint stays in place
//! as a second line; a violation there surfaces as `OrderError::Conflict`.

use sqlx::postgres::PgConnection;
use sqlx::PgPool;
use stallq_schemas::StallId;

use crate::error::OrderError;

/// Lock the stall and return the next token for it.
///
/// Must be called on a connection that is inside a transaction; the lock is
/// held until that transaction ends.
pub async fn allocate(conn: &mut PgConnection, stall_id: StallId) -> Result<i64, OrderError> {
    let locked: Option<i64> = sqlx::query_scalar("select id from stalls where id = $1 for update")
        .bind(stall_id)
        .fetch_optional(&mut *conn)
        .await?;
    if locked.is_none() {
        return Err(OrderError::not_found("stall", stall_id));
    }

    let next: i64 = sqlx::query_scalar(
        "select coalesce(max(token), 0) + 1 from orders where stall_id = $1",
    )
    .bind(stall_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(next)
}

/// Highest token issued so far for a stall; 0 when none (or no such stall).
pub async fn current_token(pool: &PgPool, stall_id: StallId) -> Result<i64, OrderError> {
    let current: i64 =
        sqlx::query_scalar("select coalesce(max(token), 0) from orders where stall_id = $1")
            .bind(stall_id)
            .fetch_one(pool)
            .await?;
    Ok(current)
}
