use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::category::Category;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Outcome,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "outcome" => Ok(TransactionType::Outcome),
            _ => Err(LedgerError::InvalidTransactionType(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid transaction type: '{0}' (expected income or outcome)")]
    InvalidTransactionType(String),
    #[error("Outcome of {requested} exceeds available balance of {available}")]
    InsufficientBalance { requested: Money, available: Money },
    #[error("Transaction title must not be blank")]
    BlankTitle,
}

/// A transaction that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub value: Money,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub value: Money,
    pub category: Option<Category>,
}

impl Transaction {
    pub fn from_new(id: TransactionId, draft: NewTransaction) -> Self {
        Transaction {
            id,
            title: draft.title,
            kind: draft.kind,
            value: draft.value,
            category: draft.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub income: Money,
    pub outcome: Money,
    pub total: Money,
}

impl Balance {
    pub fn new(income: Money, outcome: Money) -> Self {
        Balance {
            income,
            outcome,
            total: income - outcome,
        }
    }

    pub fn from_transactions<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let (mut income, mut outcome) = (Money::zero(), Money::zero());
        for tx in txs {
            match tx.kind {
                TransactionType::Income => income = income + tx.value,
                TransactionType::Outcome => outcome = outcome + tx.value,
            }
        }
        Balance::new(income, outcome)
    }

    /// Rejects a blank title, and an outcome larger than the current total.
    pub fn authorize(&self, draft: &NewTransaction) -> Result<(), LedgerError> {
        if draft.title.trim().is_empty() {
            return Err(LedgerError::BlankTitle);
        }
        if draft.kind == TransactionType::Outcome && draft.value > self.total {
            return Err(LedgerError::InsufficientBalance {
                requested: draft.value,
                available: self.total,
            });
        }
        Ok(())
    }
}

impl Default for Balance {
    fn default() -> Self {
        Balance::new(Money::zero(), Money::zero())
    }
}
