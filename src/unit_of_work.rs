use async_trait::async_trait;
use tracing::error;

use crate::store::{CartStore, CategoryStore, ProductCatalog};
use crate::{ServiceResult, StoreResult};

/// Unit of Work pattern for managing transactions.
///
/// The UnitOfWork hands out sessions; each service operation begins exactly
/// one and finishes it with commit or rollback.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Begin a new transaction session.
    async fn begin(&self) -> StoreResult<Self::Session>;
}

/// Represents a single transaction session.
///
/// The session is also the store: catalog, category and cart calls made on
/// it see each other's writes and become visible to others only on commit.
#[async_trait]
pub trait UnitOfWorkSession: ProductCatalog + CategoryStore + CartStore + Send + Sync {
    /// Commit every write made through this session.
    async fn commit(self) -> StoreResult<()>;

    /// Discard every write made through this session.
    async fn rollback(self) -> StoreResult<()>;
}

/// Commits the session when `outcome` is Ok, rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
pub async fn finish<S, T>(session: S, outcome: ServiceResult<T>) -> ServiceResult<T>
where
    S: UnitOfWorkSession,
{
    match outcome {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                error!(error = %rollback_err, original = %err, "Rollback failed after error");
            }
            Err(err)
        }
    }
}
