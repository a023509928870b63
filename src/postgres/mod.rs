//! PostgreSQL backend: a unit of work over `sqlx` transactions.

mod queries;
pub mod schema;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::debug;

use crate::{Executor, StoreConfig, StoreError, StoreResult, UnitOfWork, UnitOfWorkSession};

/// Default implementation of UnitOfWork for PostgreSQL.
#[derive(Clone)]
pub struct PostgresUnitOfWork {
    pool: Arc<PgPool>,
}

impl PostgresUnitOfWork {
    /// Create a new PostgresUnitOfWork with the given connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connect a pool from `config` and wrap it.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = config.connect().await?;
        Ok(Self::new(Arc::new(pool)))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Session = PostgresUnitOfWorkSession;

    async fn begin(&self) -> StoreResult<Self::Session> {
        let tx = self.pool.begin().await?;
        debug!("Began PostgreSQL unit of work");
        Ok(PostgresUnitOfWorkSession::new(tx))
    }
}

/// Default implementation of UnitOfWorkSession for PostgreSQL.
pub struct PostgresUnitOfWorkSession {
    executor: Executor,
}

impl PostgresUnitOfWorkSession {
    /// Create a new session from a PostgreSQL transaction.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            executor: Executor::new(tx),
        }
    }

    /// Get the executor for this session (provides access to the transaction).
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresUnitOfWorkSession {
    async fn commit(self) -> StoreResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::CommitFailed(e.to_string()))?;
        debug!("Committed PostgreSQL unit of work");
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.rollback()
            .await
            .map_err(|e| StoreError::RollbackFailed(e.to_string()))?;
        debug!("Rolled back PostgreSQL unit of work");
        Ok(())
    }
}
