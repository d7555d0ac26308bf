//! Read side: owner queues and customer histories, annotated with ETA.
//!
//! Rows are fetched unordered; ordering and projection happen in
//! `stallq-queue` so the SQL never decides who is ahead in line.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use stallq_queue::{annotate, queue_order};
use stallq_schemas::{Caller, OrderId, OrderLine, ProjectedOrder, QueueOrder, Role};

use crate::error::OrderError;
use crate::orders::status_from_row;

#[derive(Debug, Clone, Copy)]
enum Scope {
    Owner,
    Customer,
}

impl Scope {
    fn predicate(self) -> &'static str {
        match self {
            Scope::Owner => "s.owner_id = $1",
            Scope::Customer => "o.customer_id = $1",
        }
    }
}

/// Every order at the caller's stall, in queue order, with ETA as of `now`.
pub async fn owner_queue(
    pool: &PgPool,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<Vec<ProjectedOrder>, OrderError> {
    if caller.role() != Role::Owner {
        return Err(OrderError::Unauthorized(
            "only an owner may view a stall queue".to_string(),
        ));
    }
    let rows = load(pool, Scope::Owner, caller.user_id()).await?;
    Ok(project(rows, now))
}

/// The caller's own orders across stalls, in queue order, with ETA as of `now`.
///
/// The prep clock runs over the customer's own active orders only; other
/// customers' orders at the same stall are not part of this view.
pub async fn customer_orders(
    pool: &PgPool,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<Vec<ProjectedOrder>, OrderError> {
    if caller.role() != Role::Customer {
        return Err(OrderError::Unauthorized(
            "only a customer may view order history".to_string(),
        ));
    }
    let rows = load(pool, Scope::Customer, caller.user_id()).await?;
    Ok(project(rows, now))
}

fn project(mut rows: Vec<QueueOrder>, now: DateTime<Utc>) -> Vec<ProjectedOrder> {
    queue_order(&mut rows);
    annotate(rows, now)
}

async fn load(pool: &PgPool, scope: Scope, user_id: i64) -> Result<Vec<QueueOrder>, OrderError> {
    let sql = format!(
        r#"
        select o.id, o.stall_id, o.customer_id, o.token, o.status, o.price,
               o.created_at, o.accepted_at,
               least(
                   sum(oi.quantity::numeric * p.prep_time_minutes),
                   9223372036854775807
               )::bigint as prep_minutes
          from orders o
          join stalls s on s.id = o.stall_id
          left join order_items oi on oi.order_id = o.id
          left join products p on p.id = oi.product_id
         where {}
         group by o.id
        "#,
        scope.predicate()
    );

    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    let mut orders = rows
        .iter()
        .map(order_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
    let mut lines = load_lines(pool, &ids).await?;
    for order in &mut orders {
        order.lines = lines.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
}

fn order_from_row(row: &PgRow) -> Result<QueueOrder, OrderError> {
    Ok(QueueOrder {
        id: row.try_get("id")?,
        stall_id: row.try_get("stall_id")?,
        customer_id: row.try_get("customer_id")?,
        token: row.try_get("token")?,
        status: status_from_row(row, "status")?,
        total_price: row.try_get("price")?,
        prep_minutes: row.try_get("prep_minutes")?,
        created_at: row.try_get("created_at")?,
        accepted_at: row.try_get("accepted_at")?,
        lines: Vec::new(),
    })
}

async fn load_lines(
    pool: &PgPool,
    order_ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderLine>>, OrderError> {
    let mut out: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(out);
    }

    let rows = sqlx::query(
        r#"
        select oi.order_id, oi.product_id, p.product_name, oi.quantity
          from order_items oi
          join products p on p.id = oi.product_id
         where oi.order_id = any($1)
         order by oi.id
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    for row in rows {
        let order_id: OrderId = row.try_get("order_id")?;
        out.entry(order_id).or_default().push(OrderLine {
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
        });
    }
    Ok(out)
}
