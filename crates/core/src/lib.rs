pub mod category;
pub mod money;
pub mod transaction;

pub use category::{Category, CategoryId};
pub use money::Money;
pub use transaction::{
    Balance, LedgerError, NewTransaction, Transaction, TransactionId, TransactionType,
};
