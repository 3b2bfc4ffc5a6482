use std::collections::{HashMap, HashSet};
use tally_core::Category;

use crate::store::{CategoryStore, StoreError};

/// Every category a batch refers to, looked up by title.
#[derive(Debug, Default, Clone)]
pub struct CategoryIndex {
    categories: Vec<Category>,
    by_title: HashMap<String, usize>,
    created: usize,
}

impl CategoryIndex {
    fn new(created: Vec<Category>, existing: Vec<Category>) -> Self {
        let created_count = created.len();
        let mut index = CategoryIndex {
            categories: Vec::with_capacity(created_count + existing.len()),
            by_title: HashMap::new(),
            created: created_count,
        };
        for category in created.into_iter().chain(existing) {
            // First entry for a title wins.
            if !index.by_title.contains_key(&category.title) {
                index
                    .by_title
                    .insert(category.title.clone(), index.categories.len());
                index.categories.push(category);
            }
        }
        index
    }

    pub fn get(&self, title: &str) -> Option<&Category> {
        self.by_title.get(title).map(|&i| &self.categories[i])
    }

    /// Newly created categories first, then the ones that already existed.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn created(&self) -> &[Category] {
        &self.categories[..self.created.min(self.categories.len())]
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Distinct non-blank names in first-seen order.
pub fn distinct_titles<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Resolves category names against the store, creating only the missing ones.
pub async fn reconcile_categories<'a, S>(
    store: &S,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<CategoryIndex, StoreError>
where
    S: CategoryStore + ?Sized,
{
    let titles = distinct_titles(names);
    if titles.is_empty() {
        return Ok(CategoryIndex::default());
    }

    let existing = store.find_by_titles(&titles).await?;
    let known: HashSet<&str> = existing.iter().map(|c| c.title.as_str()).collect();

    let missing: Vec<String> = titles
        .iter()
        .filter(|t| !known.contains(t.as_str()))
        .cloned()
        .collect();

    let created = if missing.is_empty() {
        Vec::new()
    } else {
        store.insert_many(&missing).await?
    };

    tracing::debug!(
        reused = existing.len(),
        created = created.len(),
        "Reconciled categories"
    );

    Ok(CategoryIndex::new(created, existing))
}
