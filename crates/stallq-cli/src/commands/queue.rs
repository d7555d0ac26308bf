//! `stallq queue owner | customer` and `stallq token current`

use anyhow::{Context, Result};
use chrono::Utc;
use stallq_db::{queue, tokens};
use stallq_schemas::{ProjectedOrder, Role};

use super::{caller, opt, CliConfig};

fn print_queue(rows: &[ProjectedOrder], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(rows).context("serialize queue")?
        );
        return Ok(());
    }

    println!("orders={}", rows.len());
    for r in rows {
        let items: Vec<String> = r
            .order
            .lines
            .iter()
            .map(|l| format!("{}x{}", l.product_name, l.quantity))
            .collect();
        println!(
            "order_id={} stall_id={} token={} status={} price={} prep_minutes={} remaining_minutes={} ready_at={} items={}",
            r.order.id,
            r.order.stall_id,
            r.order.token,
            r.order.status,
            r.order.total_price,
            opt(r.order.prep_minutes),
            opt(r.remaining_minutes),
            opt(r.ready_at.map(|t| t.to_rfc3339())),
            items.join(",")
        );
    }
    Ok(())
}

pub async fn owner(cfg: &CliConfig, owner_id: i64, json: bool) -> Result<()> {
    let who = caller(owner_id, Role::Owner)?;
    let pool = cfg.pool().await?;
    let rows = queue::owner_queue(&pool, &who, Utc::now()).await?;
    print_queue(&rows, json)
}

pub async fn customer(cfg: &CliConfig, customer_id: i64, json: bool) -> Result<()> {
    let who = caller(customer_id, Role::Customer)?;
    let pool = cfg.pool().await?;
    let rows = queue::customer_orders(&pool, &who, Utc::now()).await?;
    print_queue(&rows, json)
}

pub async fn current_token(cfg: &CliConfig, stall_id: i64) -> Result<()> {
    let pool = cfg.pool().await?;
    let token = tokens::current_token(&pool, stall_id).await?;
    println!("stall_id={} token={}", stall_id, token);
    Ok(())
}
