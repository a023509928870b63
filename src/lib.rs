//! Cart Reconciler
//!
//! Products, categories and per-user shopping carts on top of a transactional
//! unit of work. Every service operation runs inside one session that commits
//! on success and rolls back on failure, so creating a cart and adding its first
//! item land together or not at all.

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod identity;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod reconciler;
pub mod store;
pub mod unit_of_work;

pub use catalog::CatalogService;
pub use config::{ConfigError, StoreConfig};
pub use error::{Missing, ServiceError, ServiceResult, StoreError, StoreResult};
pub use executor::Executor;
pub use identity::UserIdentity;
pub use memory::{InMemoryUnitOfWork, InMemoryUnitOfWorkSession};
pub use models::{subtotal, CartItem, CartLine, Category, NewProduct, Product, ShoppingCart};
pub use postgres::{PostgresUnitOfWork, PostgresUnitOfWorkSession};
pub use reconciler::CartReconciler;
pub use store::{CartStore, CategoryStore, ProductCatalog};
pub use unit_of_work::{UnitOfWork, UnitOfWorkSession};
