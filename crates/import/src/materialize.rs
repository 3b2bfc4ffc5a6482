use tally_core::{NewTransaction, Transaction};

use crate::csv::CsvRow;
use crate::reconcile::CategoryIndex;
use crate::store::{StoreError, TransactionStore};

/// One draft per row, in row order. A category name missing from the index
/// leaves the draft uncategorized.
pub fn materialize(rows: Vec<CsvRow>, categories: &CategoryIndex) -> Vec<NewTransaction> {
    rows.into_iter()
        .map(|row| NewTransaction {
            category: row
                .category
                .as_deref()
                .and_then(|title| categories.get(title))
                .cloned(),
            title: row.title,
            kind: row.kind,
            value: row.value,
        })
        .collect()
}

/// Writes the batch with a single store call.
pub async fn persist<S>(store: &S, drafts: Vec<NewTransaction>) -> Result<Vec<Transaction>, StoreError>
where
    S: TransactionStore + ?Sized,
{
    if drafts.is_empty() {
        return Ok(Vec::new());
    }
    store.insert_many(drafts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile_categories;
    use crate::store::memory::MemoryStore;
    use tally_core::{Money, TransactionType};

    fn row(title: &str, category: Option<&str>) -> CsvRow {
        CsvRow {
            title: title.to_string(),
            kind: TransactionType::Outcome,
            value: Money::from_cents(1000),
            category: category.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn drafts_follow_row_order_and_share_categories() {
        let store = MemoryStore::default();
        let index = reconcile_categories(&store, ["Food"]).await.unwrap();

        let drafts = materialize(
            vec![row("Lunch", Some("Food")), row("Bus", None), row("Dinner", Some("Food"))],
            &index,
        );

        let titles: Vec<_> = drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Lunch", "Bus", "Dinner"]);
        assert_eq!(drafts[0].category, drafts[2].category);
        assert_eq!(drafts[0].category.as_ref().unwrap().title, "Food");
        assert!(drafts[1].category.is_none());
        assert_eq!(drafts[0].value.to_cents(), 1000);
    }

    #[test]
    fn unknown_category_is_left_empty() {
        let drafts = materialize(vec![row("Lunch", Some("Food"))], &CategoryIndex::default());
        assert!(drafts[0].category.is_none());
    }

    #[tokio::test]
    async fn persist_writes_once_in_order() {
        let store = MemoryStore::default();
        let drafts = materialize(vec![row("A", None), row("B", None)], &CategoryIndex::default());

        let created = persist(&store, drafts).await.unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].title, "A");
        assert_eq!(created[1].id.0, 2);
        assert_eq!(store.transactions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn persist_empty_batch_is_noop() {
        let store = MemoryStore {
            fail_transactions: true,
            ..Default::default()
        };
        assert!(persist(&store, Vec::new()).await.unwrap().is_empty());
    }
}
