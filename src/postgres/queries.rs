use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;
use uuid::Uuid;

use super::PostgresUnitOfWorkSession;
use crate::models::{CartItem, CartLine, Category, Product, ShoppingCart};
use crate::store::{CartStore, CategoryStore, ProductCatalog};
use crate::{StoreResult, UserIdentity};

const PRODUCT_COLUMNS: &str = "id, name, description, price, category_id";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, unit_price";

#[async_trait]
impl ProductCatalog for PostgresUnitOfWorkSession {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(product)
    }

    async fn price_of(&self, id: Uuid) -> StoreResult<Option<Decimal>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let row = sqlx::query("SELECT price FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(|r| r.get("price")))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"
        ))
        .fetch_all(&mut **tx)
        .await?;
        Ok(products)
    }

    async fn list_products_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Product>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY name, id"
        ))
        .bind(category_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(products)
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                category_id = EXCLUDED.category_id
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryStore for PostgresUnitOfWorkSession {
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let category =
            sqlx::query_as::<_, Category>("SELECT id, description FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, description FROM categories ORDER BY description, id",
        )
        .fetch_all(&mut **tx)
        .await?;
        Ok(categories)
    }

    async fn save_category(&self, category: &Category) -> StoreResult<()> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        sqlx::query(
            r#"
            INSERT INTO categories (id, description) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET description = EXCLUDED.description
            "#,
        )
        .bind(category.id)
        .bind(&category.description)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CartStore for PostgresUnitOfWorkSession {
    async fn find_cart_by_user(&self, user: &UserIdentity) -> StoreResult<Option<ShoppingCart>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let cart = sqlx::query_as::<_, ShoppingCart>(
            "SELECT id, user_identity FROM shopping_carts WHERE user_identity = $1",
        )
        .bind(user.as_str())
        .fetch_optional(&mut **tx)
        .await?;
        Ok(cart)
    }

    async fn create_cart(&self, user: &UserIdentity) -> StoreResult<ShoppingCart> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        // A concurrent first add for the same user resolves to the row that won.
        let cart = sqlx::query_as::<_, ShoppingCart>(
            r#"
            INSERT INTO shopping_carts (id, user_identity) VALUES ($1, $2)
            ON CONFLICT (user_identity) DO UPDATE SET user_identity = EXCLUDED.user_identity
            RETURNING id, user_identity
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.as_str())
        .fetch_one(&mut **tx)
        .await?;
        Ok(cart)
    }

    async fn find_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> StoreResult<Option<CartItem>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let item = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 AND product_id = $2"
        ))
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(item)
    }

    async fn find_item(&self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let item = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(item)
    }

    async fn list_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let rows = sqlx::query(
            r#"
            SELECT ci.id AS item_id, ci.quantity, ci.unit_price,
                   p.id AS product_id, p.name, p.description, p.price, p.category_id
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.seq
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CartLine {
                item_id: r.get("item_id"),
                product: Product {
                    id: r.get("product_id"),
                    name: r.get("name"),
                    description: r.get("description"),
                    price: r.get("price"),
                    category_id: r.get("category_id"),
                },
                quantity: r.get("quantity"),
                unit_price: r.get("unit_price"),
            })
            .collect())
    }

    async fn upsert_item(&self, item: &CartItem) -> StoreResult<()> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET quantity = EXCLUDED.quantity, unit_price = EXCLUDED.unit_price
            "#,
        )
        .bind(item.id)
        .bind(item.cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool> {
        let mut guard = self.executor.lock().await;
        let tx = guard.transaction()?;
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
