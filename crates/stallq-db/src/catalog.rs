//! Catalog reads and minimal seeding.
//!
//! Reads return `OrderError` because the HTTP surface maps them alongside the
//! order service. Seeding is an operator/test concern and returns `anyhow`.

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use stallq_schemas::{Product, ProductId, Role, Stall, StallId, UserId};

use crate::error::{is_unique_violation, OrderError};

const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Upper bound on per-unit prep time (one day); matches `ck_products_prep_time`.
pub const MAX_PREP_MINUTES: i64 = 24 * 60;

const PRODUCT_COLUMNS: &str = r#"
    id, stall_id, product_name, price, prep_time_minutes, available_quantity, is_active
"#;

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: row.try_get("id")?,
        stall_id: row.try_get("stall_id")?,
        name: row.try_get("product_name")?,
        price: row.try_get("price")?,
        prep_minutes: row.try_get("prep_time_minutes")?,
        available_quantity: row.try_get("available_quantity")?,
        is_active: row.try_get("is_active")?,
    })
}

fn stall_from_row(row: &PgRow) -> Result<Stall, sqlx::Error> {
    Ok(Stall {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("stall_name")?,
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Active stalls, ordered by id.
pub async fn list_stalls(pool: &PgPool) -> Result<Vec<Stall>, OrderError> {
    let rows = sqlx::query("select id, owner_id, stall_name from stalls where is_active order by id")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(stall_from_row).collect::<Result<_, _>>()?)
}

pub async fn stall_for_owner(pool: &PgPool, owner_id: UserId) -> Result<Option<Stall>, OrderError> {
    let row = sqlx::query("select id, owner_id, stall_name from stalls where owner_id = $1")
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(stall_from_row).transpose()?)
}

/// Active products of one stall, ordered by id. Unknown stall is `NotFound`.
pub async fn list_stall_products(pool: &PgPool, stall_id: StallId) -> Result<Vec<Product>, OrderError> {
    let exists: Option<i64> = sqlx::query_scalar("select id from stalls where id = $1 and is_active")
        .bind(stall_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(OrderError::not_found("stall", stall_id));
    }

    let sql = format!(
        "select {PRODUCT_COLUMNS} from products where stall_id = $1 and is_active order by id"
    );
    let rows = sqlx::query(&sql).bind(stall_id).fetch_all(pool).await?;
    Ok(rows.iter().map(product_from_row).collect::<Result<_, _>>()?)
}

/// Every product (active or not) of the stall owned by `owner_id`.
pub async fn owner_products(pool: &PgPool, owner_id: UserId) -> Result<Vec<Product>, OrderError> {
    let rows = sqlx::query(
        r#"
        select p.id, p.stall_id, p.product_name, p.price, p.prep_time_minutes,
               p.available_quantity, p.is_active
          from products p
          join stalls s on s.id = p.stall_id
         where s.owner_id = $1
         order by p.id
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(product_from_row).collect::<Result<_, _>>()?)
}

pub async fn fetch_product(pool: &PgPool, product_id: ProductId) -> Result<Product, OrderError> {
    let sql = format!("select {PRODUCT_COLUMNS} from products where id = $1");
    let row = sqlx::query(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await?
        .ok_or(OrderError::not_found("product", product_id))?;
    Ok(product_from_row(&row)?)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
    pub prep_minutes: i64,
    pub available_quantity: i64,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("product name must not be empty");
        }
        if self.price <= 0 {
            bail!("price must be > 0 (got {})", self.price);
        }
        if self.prep_minutes <= 0 || self.prep_minutes > MAX_PREP_MINUTES {
            bail!(
                "prep time must be between 1 and {MAX_PREP_MINUTES} minutes (got {})",
                self.prep_minutes
            );
        }
        if self.available_quantity <= 0 {
            bail!(
                "available quantity must be > 0 (got {})",
                self.available_quantity
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredOwner {
    pub owner_id: UserId,
    pub stall_id: StallId,
    pub product_id: ProductId,
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        bail!("username must not be empty");
    }
    Ok(())
}

async fn insert_user_on<'e, E>(exec: E, username: &str, role: Role) -> Result<UserId>
where
    E: sqlx::PgExecutor<'e>,
{
    let res: Result<UserId, sqlx::Error> =
        sqlx::query_scalar("insert into users (username, role) values ($1, $2) returning id")
            .bind(username.trim())
            .bind(role.as_str())
            .fetch_one(exec)
            .await;

    match res {
        Ok(id) => Ok(id),
        Err(e) if is_unique_violation(&e, USERNAME_CONSTRAINT) => {
            bail!("username {:?} already exists", username.trim())
        }
        Err(e) => Err(e).context("insert user failed"),
    }
}

pub async fn insert_user(pool: &PgPool, username: &str, role: Role) -> Result<UserId> {
    validate_username(username)?;
    insert_user_on(pool, username, role).await
}

/// Create an owner account together with its stall and first product.
/// All three rows commit together or not at all.
pub async fn register_owner(
    pool: &PgPool,
    username: &str,
    stall_name: &str,
    first_product: &NewProduct,
) -> Result<RegisteredOwner> {
    validate_username(username)?;
    if stall_name.trim().is_empty() {
        bail!("stall name must not be empty");
    }
    first_product.validate()?;

    let mut tx = pool.begin().await.context("begin register_owner tx")?;

    let owner_id = insert_user_on(&mut *tx, username, Role::Owner).await?;

    let stall_id: StallId = sqlx::query_scalar(
        "insert into stalls (owner_id, stall_name) values ($1, $2) returning id",
    )
    .bind(owner_id)
    .bind(stall_name.trim())
    .fetch_one(&mut *tx)
    .await
    .context("insert stall failed")?;

    let product_id = insert_product_on(&mut *tx, stall_id, first_product).await?;

    tx.commit().await.context("commit register_owner tx")?;

    tracing::info!(owner_id, stall_id, product_id, "owner registered");
    Ok(RegisteredOwner {
        owner_id,
        stall_id,
        product_id,
    })
}

async fn insert_product_on<'e, E>(exec: E, stall_id: StallId, p: &NewProduct) -> Result<ProductId>
where
    E: sqlx::PgExecutor<'e>,
{
    let id: ProductId = sqlx::query_scalar(
        r#"
        insert into products (stall_id, product_name, price, prep_time_minutes, available_quantity)
        values ($1, $2, $3, $4, $5)
        returning id
        "#,
    )
    .bind(stall_id)
    .bind(p.name.trim())
    .bind(p.price)
    .bind(p.prep_minutes)
    .bind(p.available_quantity)
    .fetch_one(exec)
    .await
    .context("insert product failed")?;
    Ok(id)
}

/// Add a product to the stall owned by `owner_id`.
pub async fn add_product(pool: &PgPool, owner_id: UserId, product: &NewProduct) -> Result<ProductId> {
    product.validate()?;

    let Some(stall) = stall_for_owner(pool, owner_id).await? else {
        bail!("owner {owner_id} has no stall");
    };

    let product_id = insert_product_on(pool, stall.id, product).await?;
    tracing::info!(owner_id, stall_id = stall.id, product_id, "product added");
    Ok(product_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> NewProduct {
        NewProduct {
            name: "Masala Dosa".to_string(),
            price: 60,
            prep_minutes: 8,
            available_quantity: 20,
        }
    }

    #[test]
    fn valid_product_passes() {
        product().validate().unwrap();
    }

    #[test]
    fn product_validation_rejects_non_positive_fields() {
        let mut p = product();
        p.price = 0;
        assert!(p.validate().unwrap_err().to_string().contains("price"));

        let mut p = product();
        p.prep_minutes = -1;
        assert!(p.validate().unwrap_err().to_string().contains("prep time"));

        let mut p = product();
        p.prep_minutes = MAX_PREP_MINUTES + 1;
        assert!(p.validate().unwrap_err().to_string().contains("prep time"));
        p.prep_minutes = MAX_PREP_MINUTES;
        p.validate().unwrap();

        let mut p = product();
        p.available_quantity = 0;
        assert!(p.validate().unwrap_err().to_string().contains("available quantity"));

        let mut p = product();
        p.name = "   ".to_string();
        assert!(p.validate().is_err());
    }
}
