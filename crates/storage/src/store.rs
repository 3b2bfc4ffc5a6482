use async_trait::async_trait;
use tally_core::{Category, NewTransaction, Transaction};
use tally_import::{CategoryStore, StoreError, TransactionStore};

use crate::db::{self, DbPool};

/// SQLite-backed implementation of the import capabilities.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CategoryStore for SqliteStore {
    async fn find_by_titles(&self, titles: &[String]) -> Result<Vec<Category>, StoreError> {
        db::get_categories_by_titles(&self.pool, titles)
            .await
            .map_err(|e| StoreError::new("find categories", e))
    }

    async fn insert_many(&self, titles: &[String]) -> Result<Vec<Category>, StoreError> {
        db::insert_categories(&self.pool, titles)
            .await
            .map_err(|e| StoreError::new("insert categories", e))
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn insert_many(
        &self,
        drafts: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, StoreError> {
        db::insert_transactions(&self.pool, drafts)
            .await
            .map_err(|e| StoreError::new("insert transactions", e))
    }
}
