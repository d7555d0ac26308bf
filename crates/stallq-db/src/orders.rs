//! Order service: the only writer that touches tokens and inventory together.
//!
//! Every public operation runs in exactly one `sqlx::Transaction`. Early
//! returns drop the transaction, which rolls it back, so a failed call leaves
//! no trace in the store.

use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{PgPool, Row};
use stallq_config::OrderPolicy;
use stallq_queue::{plan, Actor, OrderEvent, SideEffect, Transition, TransitionError};
use stallq_schemas::{Caller, OrderId, OrderRecord, OrderStatus, Placed, ProductId, Role, UserId};

use crate::error::OrderError;
use crate::{ledger, tokens};

fn require_role(caller: &Caller, role: Role, action: &str) -> Result<(), OrderError> {
    if caller.role() != role {
        return Err(OrderError::Unauthorized(format!(
            "only a {role} may {action} (caller {} is {})",
            caller.user_id(),
            caller.role()
        )));
    }
    Ok(())
}

pub(crate) fn status_from_row(row: &PgRow, col: &str) -> Result<OrderStatus, OrderError> {
    let raw: String = row.try_get(col)?;
    raw.parse::<OrderStatus>()
        .map_err(|e| OrderError::Store(sqlx::Error::Decode(Box::new(e))))
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    policy: OrderPolicy,
}

impl OrderService {
    pub fn new(pool: PgPool, policy: OrderPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn policy(&self) -> OrderPolicy {
        self.policy
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Place a single-line order for `quantity` units of `product_id`.
    ///
    /// A token race lost at the unique constraint is retried up to
    /// `policy.conflict_retries` times; every attempt is its own transaction.
    pub async fn place_order(
        &self,
        caller: &Caller,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Placed, OrderError> {
        require_role(caller, Role::Customer, "place orders")?;
        if quantity <= 0 {
            return Err(OrderError::InvalidRequest(format!(
                "quantity must be > 0 (got {quantity})"
            )));
        }
        if quantity > self.policy.max_quantity_per_order {
            return Err(OrderError::InvalidRequest(format!(
                "quantity {quantity} exceeds the per-order maximum of {}",
                self.policy.max_quantity_per_order
            )));
        }

        let mut attempt: u32 = 0;
        loop {
            match self.try_place(caller.user_id(), product_id, quantity).await {
                Ok(placed) => {
                    tracing::info!(
                        order_id = placed.order_id,
                        stall_id = placed.stall_id,
                        token = placed.token,
                        customer_id = caller.user_id(),
                        "order placed"
                    );
                    return Ok(placed);
                }
                Err(OrderError::Conflict(msg)) if attempt < self.policy.conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        product_id,
                        attempt,
                        reason = %msg,
                        "token conflict; retrying placement"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        product_id,
                        quantity,
                        kind = err.kind(),
                        error = %err,
                        "order placement failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn try_place(
        &self,
        customer_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Placed, OrderError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "select stall_id, price, available_quantity, is_active from products where id = $1",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(OrderError::not_found("product", product_id))?;

        let is_active: bool = row.try_get("is_active")?;
        if !is_active {
            return Err(OrderError::not_found("product", product_id));
        }
        let stall_id: i64 = row.try_get("stall_id")?;
        let unit_price: i64 = row.try_get("price")?;
        let available: i64 = row.try_get("available_quantity")?;

        if available < quantity {
            return Err(OrderError::InsufficientStock {
                product_id,
                requested: quantity,
            });
        }

        let token = tokens::allocate(&mut *tx, stall_id).await?;

        let price = unit_price.checked_mul(quantity).ok_or_else(|| {
            OrderError::InvalidRequest(format!(
                "order price overflows ({unit_price} x {quantity})"
            ))
        })?;

        let order_id: OrderId = sqlx::query_scalar(
            r#"
            insert into orders (customer_id, stall_id, price, token)
            values ($1, $2, $3, $4)
            returning id
            "#,
        )
        .bind(customer_id)
        .bind(stall_id)
        .bind(price)
        .bind(token)
        .fetch_one(&mut *tx)
        .await
        .map_err(OrderError::from_write)?;

        sqlx::query("insert into order_items (order_id, product_id, quantity) values ($1, $2, $3)")
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        // Re-checks sufficiency at write time; a concurrent reservation that
        // slipped in after the read above fails here and rolls everything back.
        ledger::reserve(&mut *tx, product_id, quantity).await?;

        tx.commit().await.map_err(OrderError::from_write)?;

        Ok(Placed {
            order_id,
            stall_id,
            token,
            price,
        })
    }

    // -----------------------------------------------------------------------
    // Status changes
    // -----------------------------------------------------------------------

    /// Customer cancels their own pending order; its inventory is released.
    pub async fn cancel_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
    ) -> Result<Transition, OrderError> {
        require_role(caller, Role::Customer, "cancel orders")?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("select customer_id, status from orders where id = $1 for update")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(OrderError::not_found("order", order_id))?;

        let customer_id: UserId = row.try_get("customer_id")?;
        if customer_id != caller.user_id() {
            return Err(OrderError::Unauthorized(format!(
                "order {order_id} does not belong to customer {}",
                caller.user_id()
            )));
        }
        let current = status_from_row(&row, "status")?;

        let transition = plan(current, OrderEvent::Cancel, Actor::Customer)?;
        apply(&mut *tx, order_id, transition).await?;
        tx.commit().await?;

        tracing::info!(order_id, customer_id, from = %transition.from, "order cancelled");
        Ok(transition)
    }

    /// Owner moves an order of their stall to `target` (accepted, rejected or ready).
    pub async fn transition_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Transition, OrderError> {
        require_role(caller, Role::Owner, "change order status")?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            select o.status, s.owner_id
              from orders o
              join stalls s on s.id = o.stall_id
             where o.id = $1
               for update of o
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(OrderError::not_found("order", order_id))?;

        let owner_id: UserId = row.try_get("owner_id")?;
        if owner_id != caller.user_id() {
            return Err(OrderError::Unauthorized(format!(
                "order {order_id} is not at a stall owned by {}",
                caller.user_id()
            )));
        }
        let current = status_from_row(&row, "status")?;

        let Some(event) = OrderEvent::for_target(target) else {
            return Err(TransitionError {
                from: current,
                requested: target,
                actor: Actor::Owner,
            }
            .into());
        };
        let transition = plan(current, event, Actor::Owner)?;
        apply(&mut *tx, order_id, transition).await?;
        tx.commit().await?;

        tracing::info!(
            order_id,
            owner_id,
            from = %transition.from,
            to = %transition.to,
            "order status changed"
        );
        Ok(transition)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<OrderRecord, OrderError> {
        let row = sqlx::query(
            r#"
            select id, customer_id, stall_id, token, price, status, created_at, accepted_at
              from orders
             where id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::not_found("order", order_id))?;

        Ok(OrderRecord {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            stall_id: row.try_get("stall_id")?,
            token: row.try_get("token")?,
            price: row.try_get("price")?,
            status: status_from_row(&row, "status")?,
            created_at: row.try_get("created_at")?,
            accepted_at: row.try_get("accepted_at")?,
        })
    }
}

/// Carry out a planned transition on a locked order row.
///
/// The status guard in the update makes a stale plan fail instead of
/// overwriting a status it did not inspect.
async fn apply(
    conn: &mut PgConnection,
    order_id: OrderId,
    transition: Transition,
) -> Result<(), OrderError> {
    let sql = match transition.effect {
        SideEffect::StampAcceptedAt => {
            "update orders set status = $3, accepted_at = now() where id = $1 and status = $2"
        }
        SideEffect::ReleaseInventory => {
            release_items(conn, order_id).await?;
            "update orders set status = $3 where id = $1 and status = $2"
        }
        SideEffect::None => "update orders set status = $3 where id = $1 and status = $2",
    };

    let res = sqlx::query(sql)
        .bind(order_id)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .execute(&mut *conn)
        .await?;

    if res.rows_affected() == 0 {
        return Err(OrderError::Conflict(format!(
            "order {order_id} left status {} concurrently",
            transition.from
        )));
    }
    Ok(())
}

async fn release_items(conn: &mut PgConnection, order_id: OrderId) -> Result<(), OrderError> {
    let items: Vec<(ProductId, i64)> = sqlx::query_as(
        "select product_id, quantity from order_items where order_id = $1 order by id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    for (product_id, quantity) in items {
        ledger::release(conn, product_id, quantity).await?;
    }
    Ok(())
}
