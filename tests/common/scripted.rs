use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use cart_reconciler::{
    CartItem, CartLine, CartStore, Category, CategoryStore, InMemoryUnitOfWork,
    InMemoryUnitOfWorkSession, Product, ProductCatalog, ShoppingCart, StoreError, StoreResult,
    UnitOfWork, UnitOfWorkSession, UserIdentity,
};

/// In-memory unit of work with scripted behaviour, counting commits and
/// rollbacks.
///
/// `failing_item_writes` makes every cart item write fail, so a cart created
/// earlier in the same operation must roll back with it. `with_commit_barrier`
/// holds each commit until the barrier releases, so concurrent operations all
/// finish their reads before any of them publishes.
#[derive(Clone, Default)]
pub struct ScriptedUnitOfWork {
    pub inner: InMemoryUnitOfWork,
    fail_item_writes: bool,
    commit_barrier: Option<Arc<Barrier>>,
    rollbacks: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
}

impl ScriptedUnitOfWork {
    pub fn new(inner: InMemoryUnitOfWork) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn failing_item_writes(mut self) -> Self {
        self.fail_item_writes = true;
        self
    }

    pub fn with_commit_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.commit_barrier = Some(barrier);
        self
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UnitOfWork for ScriptedUnitOfWork {
    type Session = ScriptedSession;

    async fn begin(&self) -> StoreResult<Self::Session> {
        Ok(ScriptedSession {
            inner: self.inner.begin().await?,
            fail_item_writes: self.fail_item_writes,
            commit_barrier: self.commit_barrier.clone(),
            rollbacks: Arc::clone(&self.rollbacks),
            commits: Arc::clone(&self.commits),
        })
    }
}

pub struct ScriptedSession {
    inner: InMemoryUnitOfWorkSession,
    fail_item_writes: bool,
    commit_barrier: Option<Arc<Barrier>>,
    rollbacks: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
}

#[async_trait]
impl UnitOfWorkSession for ScriptedSession {
    async fn commit(self) -> StoreResult<()> {
        if let Some(barrier) = &self.commit_barrier {
            barrier.wait().await;
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn rollback(self) -> StoreResult<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.inner.rollback().await
    }
}

#[async_trait]
impl ProductCatalog for ScriptedSession {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        self.inner.find_product(id).await
    }

    async fn price_of(&self, id: Uuid) -> StoreResult<Option<Decimal>> {
        self.inner.price_of(id).await
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.inner.list_products().await
    }

    async fn list_products_by_category(&self, category_id: Uuid) -> StoreResult<Vec<Product>> {
        self.inner.list_products_by_category(category_id).await
    }

    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        self.inner.save_product(product).await
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_product(id).await
    }
}

#[async_trait]
impl CategoryStore for ScriptedSession {
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        self.inner.find_category(id).await
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.inner.list_categories().await
    }

    async fn save_category(&self, category: &Category) -> StoreResult<()> {
        self.inner.save_category(category).await
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_category(id).await
    }
}

#[async_trait]
impl CartStore for ScriptedSession {
    async fn find_cart_by_user(&self, user: &UserIdentity) -> StoreResult<Option<ShoppingCart>> {
        self.inner.find_cart_by_user(user).await
    }

    async fn create_cart(&self, user: &UserIdentity) -> StoreResult<ShoppingCart> {
        self.inner.create_cart(user).await
    }

    async fn find_item_for_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> StoreResult<Option<CartItem>> {
        self.inner.find_item_for_product(cart_id, product_id).await
    }

    async fn find_item(&self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
        self.inner.find_item(item_id).await
    }

    async fn list_lines(&self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
        self.inner.list_lines(cart_id).await
    }

    async fn upsert_item(&self, item: &CartItem) -> StoreResult<()> {
        if self.fail_item_writes {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.upsert_item(item).await
    }

    async fn delete_item(&self, item_id: Uuid) -> StoreResult<bool> {
        if self.fail_item_writes {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.delete_item(item_id).await
    }
}
