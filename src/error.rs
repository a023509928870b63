use std::fmt;

use uuid::Uuid;

/// Error type for store and transaction operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Transaction commit failed: {0}")]
    CommitFailed(String),

    #[error("Transaction rollback failed: {0}")]
    RollbackFailed(String),

    #[error("Unit of work session is already closed")]
    SessionClosed,

    #[error("Concurrent write conflict: {0}")]
    Conflict(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_check_violation()
            {
                return StoreError::ConstraintViolation(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What a `NotFound` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Product(Uuid),
    Category(Uuid),
    Cart(String),
    ItemNotInCart(Uuid),
    CartItem(Uuid),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Product(id) => write!(f, "product {id} not found"),
            Missing::Category(id) => write!(f, "category {id} not found"),
            Missing::Cart(user) => write!(f, "shopping cart for '{user}' not found"),
            Missing::ItemNotInCart(product_id) => write!(f, "product {product_id} not found in cart"),
            Missing::CartItem(id) => write!(f, "cart item {id} not found"),
        }
    }
}

/// Error type returned by the cart and catalog services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(Missing),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// The missing entity, if this is a `NotFound`.
    pub fn missing(&self) -> Option<&Missing> {
        match self {
            ServiceError::NotFound(missing) => Some(missing),
            _ => None,
        }
    }
}

impl From<Missing> for ServiceError {
    fn from(missing: Missing) -> Self {
        ServiceError::NotFound(missing)
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Persistence(err.into())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
