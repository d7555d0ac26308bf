//! `stallq seed owner | customer | product`

use anyhow::Result;
use clap::Args;
use stallq_db::catalog::{self, NewProduct};
use stallq_schemas::Role;

use super::CliConfig;

#[derive(Args, Debug, Clone)]
pub struct ProductArgs {
    /// Product name
    #[arg(long = "product")]
    pub name: String,
    /// Unit price in whole currency units
    #[arg(long)]
    pub price: i64,
    /// Prep time per unit, minutes
    #[arg(long)]
    pub prep_minutes: i64,
    /// Units available for ordering
    #[arg(long)]
    pub available: i64,
}

impl From<ProductArgs> for NewProduct {
    fn from(a: ProductArgs) -> Self {
        NewProduct {
            name: a.name,
            price: a.price,
            prep_minutes: a.prep_minutes,
            available_quantity: a.available,
        }
    }
}

pub async fn owner(cfg: &CliConfig, username: &str, stall: &str, product: ProductArgs) -> Result<()> {
    let product = NewProduct::from(product);
    // Validate before connecting so bad input never needs a database.
    product.validate()?;

    let pool = cfg.pool().await?;
    let reg = catalog::register_owner(&pool, username, stall, &product).await?;
    println!("owner_id={}", reg.owner_id);
    println!("stall_id={}", reg.stall_id);
    println!("product_id={}", reg.product_id);
    Ok(())
}

pub async fn customer(cfg: &CliConfig, username: &str) -> Result<()> {
    let pool = cfg.pool().await?;
    let id = catalog::insert_user(&pool, username, Role::Customer).await?;
    println!("customer_id={}", id);
    Ok(())
}

pub async fn product(cfg: &CliConfig, owner_id: i64, product: ProductArgs) -> Result<()> {
    let product = NewProduct::from(product);
    product.validate()?;

    let pool = cfg.pool().await?;
    let id = catalog::add_product(&pool, owner_id, &product).await?;
    println!("product_id={}", id);
    Ok(())
}
