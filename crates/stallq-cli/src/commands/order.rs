//! `stallq order place | cancel | status`

use anyhow::{Context, Result};
use stallq_db::OrderService;
use stallq_schemas::{OrderStatus, Role};

use super::{caller, CliConfig};

async fn service(cfg: &CliConfig) -> Result<OrderService> {
    let pool = cfg.pool().await?;
    Ok(OrderService::new(pool, cfg.settings.orders))
}

pub async fn place(cfg: &CliConfig, customer_id: i64, product_id: i64, quantity: i64) -> Result<()> {
    let who = caller(customer_id, Role::Customer)?;
    let svc = service(cfg).await?;

    let placed = svc.place_order(&who, product_id, quantity).await?;
    println!("order_id={}", placed.order_id);
    println!("stall_id={}", placed.stall_id);
    println!("token={}", placed.token);
    println!("price={}", placed.price);
    Ok(())
}

pub async fn cancel(cfg: &CliConfig, customer_id: i64, order_id: i64) -> Result<()> {
    let who = caller(customer_id, Role::Customer)?;
    let svc = service(cfg).await?;

    let t = svc.cancel_order(&who, order_id).await?;
    println!("order_id={} from={} status={}", order_id, t.from, t.to);
    Ok(())
}

pub async fn status(cfg: &CliConfig, owner_id: i64, order_id: i64, status: &str) -> Result<()> {
    let who = caller(owner_id, Role::Owner)?;
    let target: OrderStatus = status
        .parse()
        .with_context(|| "expected one of: accepted | rejected | ready".to_string())?;
    let svc = service(cfg).await?;

    let t = svc.transition_order(&who, order_id, target).await?;
    println!("order_id={} from={} status={}", order_id, t.from, t.to);
    Ok(())
}
