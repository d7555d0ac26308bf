//! `stallq db status | migrate`

use anyhow::Result;

use super::CliConfig;

pub async fn status(cfg: &CliConfig) -> Result<()> {
    let pool = cfg.pool().await?;
    let s = stallq_db::status(&pool).await?;
    println!("db_ok={} has_orders_table={}", s.ok, s.has_orders_table);
    println!("config_hash={}", cfg.config_hash);
    Ok(())
}

pub async fn migrate(cfg: &CliConfig, yes: bool) -> Result<()> {
    let pool = cfg.pool().await?;

    // Guardrail: refuse while customers are waiting on orders unless the
    // operator explicitly acknowledges with --yes.
    let n = stallq_db::count_active_orders(&pool).await?;
    if n > 0 && !yes {
        anyhow::bail!(
            "REFUSING MIGRATE: detected {} pending/accepted order(s). Re-run with: `stallq db migrate --yes`",
            n
        );
    }

    tracing::info!(active_orders = n, "applying migrations");
    stallq_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}
