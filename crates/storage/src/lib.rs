pub mod db;
pub mod store;

pub use db::{
    create_db, delete_transaction, find_or_create_category, get_all_categories,
    get_all_transactions, get_balance, get_categories_by_titles, get_transaction,
    insert_categories, insert_transaction, insert_transactions, upsert_category, DbPool,
};
pub use store::SqliteStore;
