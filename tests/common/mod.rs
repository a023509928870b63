#![allow(dead_code)]

pub mod scripted;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tracing::Level;
use uuid::Uuid;

use cart_reconciler::{
    CartStore, Category, CategoryStore, Product, ProductCatalog, ShoppingCart, UnitOfWork,
    UnitOfWorkSession, UserIdentity,
};

pub use scripted::ScriptedUnitOfWork;

pub const TEST_USER: &str = "test@example.com";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
});

pub fn setup_tracing() {
    Lazy::force(&TRACING_INIT);
}

pub fn user(identity: &str) -> UserIdentity {
    UserIdentity::new(identity).expect("valid identity")
}

pub fn product(name: &str, price: Decimal) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{name} description"),
        price,
        category_id: None,
    }
}

/// Stores a product directly through a session and commits it.
pub async fn seed_product<U: UnitOfWork>(uow: &U, name: &str, price: Decimal) -> Product {
    let product = product(name, price);
    let session = uow.begin().await.expect("Failed to begin transaction");
    session
        .save_product(&product)
        .await
        .expect("Failed to save product");
    session.commit().await.expect("Failed to commit product");
    product
}

pub async fn seed_category<U: UnitOfWork>(uow: &U, description: &str) -> Category {
    let category = Category::new(description);
    let session = uow.begin().await.expect("Failed to begin transaction");
    session
        .save_category(&category)
        .await
        .expect("Failed to save category");
    session.commit().await.expect("Failed to commit category");
    category
}

/// The user's cart as currently committed, if any.
pub async fn committed_cart<U: UnitOfWork>(uow: &U, identity: &UserIdentity) -> Option<ShoppingCart> {
    let session = uow.begin().await.expect("Failed to begin transaction");
    let cart = session
        .find_cart_by_user(identity)
        .await
        .expect("Failed to query cart");
    session.rollback().await.expect("Failed to rollback read");
    cart
}
