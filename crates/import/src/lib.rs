//! CSV transaction import: parse rows, reconcile categories, materialize and
//! persist transactions.

pub mod csv;
pub mod materialize;
pub mod reconcile;
pub mod service;
pub mod store;

pub use crate::csv::{parse_rows, CsvError, CsvRow, ParsedBatch, RawRow, RowReader};
pub use materialize::{materialize, persist};
pub use reconcile::{distinct_titles, reconcile_categories, CategoryIndex};
pub use service::{ImportError, ImportService};
pub use store::{CategoryStore, StoreError, TransactionStore};
