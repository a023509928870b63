//! In-memory backend.
//!
//! Each session works on a private copy of the state taken at `begin`.
//! Commit publishes the copy only if no other session committed writes in the
//! meantime; otherwise it fails with `StoreError::Conflict` and nothing is
//! applied. The constraints of the PostgreSQL schema are checked here too, so
//! both backends reject the same writes.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{CartItem, CartLine, Category, Product, ShoppingCart};
use crate::store::{CartStore, CategoryStore, ProductCatalog};
use crate::{StoreError, StoreResult, UnitOfWork, UnitOfWorkSession, UserIdentity};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    version: u64,
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: Vec<ShoppingCart>,
    // Insertion order is the order lines are listed in.
    items: Vec<CartItem>,
}

fn violation(message: impl Into<String>) -> StoreError {
    StoreError::ConstraintViolation(message.into())
}

impl MemoryState {
    fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn save_product(&mut self, product: &Product) -> StoreResult<()> {
        if product.price < Decimal::ZERO {
            return Err(violation("products.price must not be negative"));
        }
        if let Some(category_id) = product.category_id {
            if !self.categories.iter().any(|c| c.id == category_id) {
                return Err(violation(format!(
                    "products.category_id references missing category {category_id}"
                )));
            }
        }
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product.clone(),
            None => self.products.push(product.clone()),
        }
        Ok(())
    }

    fn delete_product(&mut self, id: Uuid) -> StoreResult<bool> {
        if self.items.iter().any(|i| i.product_id == id) {
            return Err(violation(format!("product {id} is still referenced by cart items")));
        }
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        Ok(self.products.len() != before)
    }

    fn save_category(&mut self, category: &Category) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category.clone(),
            None => self.categories.push(category.clone()),
        }
    }

    fn delete_category(&mut self, id: Uuid) -> StoreResult<bool> {
        if self.products.iter().any(|p| p.category_id == Some(id)) {
            return Err(violation(format!("category {id} is still referenced by products")));
        }
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        Ok(self.categories.len() != before)
    }

    fn create_cart(&mut self, user: &UserIdentity) -> ShoppingCart {
        if let Some(cart) = self.carts.iter().find(|c| c.user_identity == user.as_str()) {
            return cart.clone();
        }
        let cart = ShoppingCart {
            id: Uuid::new_v4(),
            user_identity: user.as_str().to_string(),
        };
        self.carts.push(cart.clone());
        cart
    }

    fn upsert_item(&mut self, item: &CartItem) -> StoreResult<()> {
        if item.quantity < 1 {
            return Err(violation("cart_items.quantity must be at least 1"));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(violation("cart_items.unit_price must not be negative"));
        }
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = item.quantity;
            existing.unit_price = item.unit_price;
            return Ok(());
        }
        if !self.carts.iter().any(|c| c.id == item.cart_id) {
            return Err(violation(format!("cart_items.cart_id references missing cart {}", item.cart_id)));
        }
        if self.product(item.product_id).is_none() {
            return Err(violation(format!(
                "cart_items.product_id references missing product {}",
                item.product_id
            )));
        }
        if self
            .items
            .iter()
            .any(|i| i.cart_id == item.cart_id && i.product_id == item.product_id)
        {
            return Err(violation(format!(
                "cart {} already holds a line for product {}",
                item.cart_id, item.product_id
            )));
        }
        self.items.push(item.clone());
        Ok(())
    }

    fn delete_item(&mut self, item_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }

    fn lines(&self, cart_id: Uuid) -> Vec<CartLine> {
        self.items
            .iter()
            .filter(|i| i.cart_id == cart_id)
            .filter_map(|i| {
                self.product(i.product_id).map(|product| CartLine {
                    item_id: i.id,
                    product: product.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
            })
            .collect()
    }
}

/// UnitOfWork over state held in process memory.
#[derive(Clone, Default)]
pub struct InMemoryUnitOfWork {
    shared: Arc<RwLock<MemoryState>>,
}

impl InMemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits that carried writes.
    pub fn version(&self) -> u64 {
        self.shared.read().version
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Session = InMemoryUnitOfWorkSession;

    async fn begin(&self) -> StoreResult<Self::Session> {
        let snapshot = self.shared.read().clone();
        Ok(InMemoryUnitOfWorkSession {
            shared: Arc::clone(&self.shared),
            base_version: snapshot.version,
            working: Mutex::new(Working {
                state: snapshot,
                dirty: false,
            }),
        })
    }
}

struct Working {
    state: MemoryState,
    dirty: bool,
}

pub struct InMemoryUnitOfWorkSession {
    shared: Arc<RwLock<MemoryState>>,
    base_version: u64,
    working: Mutex<Working>,
}

impl InMemoryUnitOfWorkSession {
    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        f(&self.working.lock().state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> StoreResult<T>) -> StoreResult<T> {
        let mut working = self.working.lock();
        let value = f(&mut working.state)?;
        working.dirty = true;
        Ok(value)
    }
}

#[async_trait]
impl UnitOfWorkSession for InMemoryUnitOfWorkSession {
    async fn commit(self) -> StoreResult<()> {
        let working = self.working.into_inner();
        if !working.dirty {
            return Ok(());
        }
        let mut shared = self.shared.write();
        if shared.version != self.base_version {
            return Err(StoreError::Conflict(format!(
                "state moved from version {} to {} during the session",
                self.base_version, shared.version
            )));
        }
        let mut next = working.state;
        next.version = self.base_version + 1;
        *shared = next;
        debug!(version = shared.version, "Committed in-memory unit of work");
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        debug!("Rolled back in-memory unit of work");
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryUnitOfWorkSession {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.read(|s| s.product(id).cloned()))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut products = self.read(|s| s.products.clone());
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn list_products_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Product>> {
        let mut products = self.list_products().await?;
        products.retain(|p| p.category_id == Some(category_id));
        Ok(products)
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        self.write(|s| s.save_product(product))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|s| s.delete_product(id))
    }
}

#[async_trait]
impl CategoryStore for InMemoryUnitOfWorkSession {
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.read(|s| s.categories.iter().find(|c| c.id == id).cloned()))
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.read(|s| s.categories.clone());
        categories.sort_by(|a, b| a.description.cmp(&b.description).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn save_category(&self, category: &Category) -> StoreResult<()> {
        self.write(|s| {
            s.save_category(category);
            Ok(())
        })
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        self.write(|s| s.delete_category(id))
    }
}

#[async_trait]
impl CartStore for InMemoryUnitOfWorkSession {
    async fn find_cart_by_user(&self, user: &UserIdentity) -> StoreResult<Option<ShoppingCart>> {
        Ok(self.read(|s| {
            s.carts
                .iter()
                .find(|c| c.user_identity == user.as_str())
                .cloned()
        }))
    }

    async fn create_cart(&self, user: &UserIdentity) -> StoreResult<ShoppingCart> {
        self.write(|s| Ok(s.create_cart(user)))
    }

    async fn find_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> StoreResult<Option<CartItem>> {
        Ok(self.read(|s| {
            s.items
                .iter()
                .find(|i| i.cart_id == cart_id && i.product_id == product_id)
                .cloned()
        }))
    }

    async fn find_item(&self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
        Ok(self.read(|s| s.items.iter().find(|i| i.id == item_id).cloned()))
    }

    async fn list_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
        Ok(self.read(|s| s.lines(cart_id)))
    }

    async fn upsert_item(&self, item: &CartItem) -> StoreResult<()> {
        self.write(|s| s.upsert_item(item))
    }

    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool> {
        self.write(|s| Ok(s.delete_item(item_id)))
    }
}
