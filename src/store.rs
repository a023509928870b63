//! Store contracts consumed by the services.
//!
//! A unit of work session implements all of them, so every call made while
//! serving one operation runs inside the same transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{CartItem, CartLine, Category, Product, ShoppingCart};
use crate::{StoreResult, UserIdentity};

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Current price of a product, `None` if the product does not exist.
    async fn price_of(&self, id: Uuid) -> StoreResult<Option<Decimal>> {
        Ok(self.find_product(id).await?.map(|product| product.price))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn list_products_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Product>>;

    /// Inserts the product or overwrites the row with the same id.
    async fn save_product(&self, product: &Product) -> StoreResult<()>;

    /// Returns false if no product had this id.
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn save_category(&self, category: &Category) -> StoreResult<()>;

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_cart_by_user(&self, user: &UserIdentity) -> StoreResult<Option<ShoppingCart>>;

    /// Creates the cart for `user`. If one already exists the existing cart is returned.
    async fn create_cart(&self, user: &UserIdentity) -> StoreResult<ShoppingCart>;

    async fn find_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> StoreResult<Option<CartItem>>;

    async fn find_item(&self, item_id: Uuid) -> StoreResult<Option<CartItem>>;

    /// Lines of a cart joined with their products, in the order they were added.
    async fn list_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>>;

    /// Inserts the item or updates quantity and unit price of the row with the same id.
    async fn upsert_item(&self, item: &CartItem) -> StoreResult<()>;

    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool>;
}
