use async_trait::async_trait;
use std::sync::Arc;
use tally_core::{Category, NewTransaction, Transaction};
use thiserror::Error;

/// Failure reported by a persistence backend.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct StoreError {
    pub context: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new(
        context: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            context,
            source: source.into(),
        }
    }
}

/// Category lookup and creation, as needed by reconciliation.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Existing categories whose title is one of `titles`.
    async fn find_by_titles(&self, titles: &[String]) -> Result<Vec<Category>, StoreError>;

    /// Creates one category per title, returned in the same order.
    async fn insert_many(&self, titles: &[String]) -> Result<Vec<Category>, StoreError>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists the whole batch; the result is in input order.
    async fn insert_many(
        &self,
        drafts: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, StoreError>;
}

#[async_trait]
impl<S: CategoryStore + ?Sized> CategoryStore for Arc<S> {
    async fn find_by_titles(&self, titles: &[String]) -> Result<Vec<Category>, StoreError> {
        (**self).find_by_titles(titles).await
    }

    async fn insert_many(&self, titles: &[String]) -> Result<Vec<Category>, StoreError> {
        (**self).insert_many(titles).await
    }
}

#[async_trait]
impl<S: TransactionStore + ?Sized> TransactionStore for Arc<S> {
    async fn insert_many(
        &self,
        drafts: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, StoreError> {
        (**self).insert_many(drafts).await
    }
}
