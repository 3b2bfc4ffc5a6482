use std::io::BufReader;
use std::path::{Path, PathBuf};
use tally_core::Transaction;
use thiserror::Error;

use crate::csv::{parse_rows, CsvError, ParsedBatch};
use crate::materialize::{materialize, persist};
use crate::reconcile::reconcile_categories;
use crate::store::{CategoryStore, StoreError, TransactionStore};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] CsvError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ImportError {
    /// True when the file itself is at fault rather than the backend.
    /// A read failure surfaced through the CSV reader is not.
    pub fn is_bad_input(&self) -> bool {
        match self {
            ImportError::Parse(CsvError::CsvError(e)) => !matches!(e.kind(), csv::ErrorKind::Io(_)),
            _ => false,
        }
    }
}

/// Orchestrates one import: parse → reconcile categories → materialize →
/// persist → remove the uploaded file.
pub struct ImportService<C, T> {
    categories: C,
    transactions: T,
}

impl<C, T> ImportService<C, T>
where
    C: CategoryStore,
    T: TransactionStore,
{
    pub fn new(categories: C, transactions: T) -> Self {
        Self {
            categories,
            transactions,
        }
    }

    /// Imports `path` and deletes it. The file is also removed when the import
    /// fails, but then only the import error is reported.
    pub async fn execute(&self, path: &Path) -> Result<Vec<Transaction>, ImportError> {
        match self.import(path).await {
            Ok(created) => {
                tokio::fs::remove_file(path)
                    .await
                    .map_err(|source| ImportError::Cleanup {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(created)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(path).await {
                    tracing::warn!(path = %path.display(), "Could not remove import file: {rm}");
                }
                Err(e)
            }
        }
    }

    async fn import(&self, path: &Path) -> Result<Vec<Transaction>, ImportError> {
        let batch = read_batch(path.to_path_buf()).await?;
        tracing::info!(
            path = %path.display(),
            rows = batch.rows.len(),
            skipped = batch.skipped,
            "Parsed import file"
        );

        let index = reconcile_categories(&self.categories, batch.category_names()).await?;
        for category in index.created() {
            tracing::info!(category = %category.title, id = %category.id, "Created category");
        }

        let drafts = materialize(batch.rows, &index);
        let created = persist(&self.transactions, drafts).await?;
        tracing::info!(count = created.len(), "Imported transactions");

        Ok(created)
    }
}

/// Reads every row before returning; the file is read on the blocking pool.
async fn read_batch(path: PathBuf) -> Result<ParsedBatch, ImportError> {
    let batch = tokio::task::spawn_blocking(move || -> Result<ParsedBatch, CsvError> {
        let file = std::fs::File::open(&path)?;
        parse_rows(BufReader::new(file))
    })
    .await??;
    Ok(batch)
}
