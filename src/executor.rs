use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::{StoreError, StoreResult};

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Executor wraps the transaction of one unit of work session.
///
/// Every store call made through a `PostgresUnitOfWorkSession` locks the same
/// transaction, so all reads and writes of a cart operation share one
/// snapshot and commit together.
#[derive(Clone, Debug)]
pub struct Executor {
    tx: SharedTransaction,
}

/// Locked access to the open transaction.
pub struct TransactionGuard<'a> {
    guard: MutexGuard<'a, Option<Transaction<'static, Postgres>>>,
}

impl TransactionGuard<'_> {
    /// The open transaction. Fails once the session has been committed or rolled back.
    pub fn transaction(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
        self.guard.as_mut().ok_or(StoreError::SessionClosed)
    }
}

impl Executor {
    /// Creates a new Executor from a PostgreSQL transaction.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Locks the transaction for the duration of one statement.
    pub async fn lock(&self) -> TransactionGuard<'_> {
        TransactionGuard {
            guard: self.tx.lock().await,
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.tx.lock().await.is_none()
    }

    /// Takes ownership of the transaction, leaving None in its place.
    /// Only commit and rollback call this.
    pub(crate) async fn take_transaction(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.tx.lock().await.take().ok_or(StoreError::SessionClosed)
    }
}
