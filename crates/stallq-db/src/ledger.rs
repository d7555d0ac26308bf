//! Inventory ledger: conditional decrement on reserve, increment on release.
//!
//! Both operations run on the caller's transaction so a rollback undoes them.

use sqlx::postgres::PgConnection;
use sqlx::PgPool;
use stallq_schemas::ProductId;

use crate::error::OrderError;

/// Take `quantity` units of `product_id` out of available stock.
///
/// The check and the decrement are one statement, so concurrent reservations
/// can never drive availability below zero.
pub async fn reserve(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i64,
) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::InvalidRequest(format!(
            "quantity must be > 0 (got {quantity})"
        )));
    }

    let res = sqlx::query(
        r#"
        update products
           set available_quantity = available_quantity - $1
         where id = $2
           and available_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if res.rows_affected() == 0 {
        return Err(OrderError::InsufficientStock {
            product_id,
            requested: quantity,
        });
    }
    Ok(())
}

/// Return `quantity` units to available stock.
pub async fn release(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i64,
) -> Result<(), OrderError> {
    let res = sqlx::query(
        "update products set available_quantity = available_quantity + $1 where id = $2",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if res.rows_affected() == 0 {
        return Err(OrderError::not_found("product", product_id));
    }
    Ok(())
}

pub async fn available(pool: &PgPool, product_id: ProductId) -> Result<i64, OrderError> {
    let qty: Option<i64> =
        sqlx::query_scalar("select available_quantity from products where id = $1")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    qty.ok_or(OrderError::not_found("product", product_id))
}
