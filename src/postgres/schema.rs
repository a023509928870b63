//! Tables used by the PostgreSQL backend.
//!
//! The unique key on `cart_items (cart_id, product_id)` is what keeps two
//! concurrent adds of the same product from producing two lines.

use sqlx::PgPool;
use tracing::info;

use crate::StoreResult;

pub const CREATE_TABLES: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY,
        description VARCHAR(200) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price NUMERIC(18, 2) NOT NULL CHECK (price >= 0),
        category_id UUID NULL REFERENCES categories(id) ON DELETE RESTRICT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shopping_carts (
        id UUID PRIMARY KEY,
        user_identity VARCHAR(256) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cart_items (
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        cart_id UUID NOT NULL REFERENCES shopping_carts(id) ON DELETE CASCADE,
        product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
        quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 1),
        unit_price NUMERIC(18, 2) NOT NULL CHECK (unit_price >= 0),
        UNIQUE (cart_id, product_id)
    )
    "#,
];

pub const DROP_TABLES: [&str; 4] = [
    "DROP TABLE IF EXISTS cart_items CASCADE",
    "DROP TABLE IF EXISTS shopping_carts CASCADE",
    "DROP TABLE IF EXISTS products CASCADE",
    "DROP TABLE IF EXISTS categories CASCADE",
];

/// Create any missing table. Safe to run on every start.
pub async fn install(pool: &PgPool) -> StoreResult<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Cart schema installed");
    Ok(())
}

pub async fn drop_all(pool: &PgPool) -> StoreResult<()> {
    for statement in DROP_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
