use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tally_core::{
    Balance, Category, LedgerError, Money, NewTransaction, Transaction, TransactionId,
    TransactionType,
};
use tally_import::ImportService;

use crate::error::AppError;
use crate::startup::AppState;

/// Multipart field carrying the CSV.
const IMPORT_FIELD: &str = "file";

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
    pub balance: Balance,
}

pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<TransactionList>, AppError> {
    let pool = state.store.pool();
    let transactions = tally_storage::get_all_transactions(pool).await?;
    let balance = tally_storage::get_balance(pool).await?;
    Ok(Json(TransactionList {
        transactions,
        balance,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub value: Money,
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let pool = state.store.pool();

    if input.value.is_negative() || input.value.checked_cents().is_none() {
        return Err(LedgerError::InvalidAmount(input.value.as_decimal().to_string()).into());
    }

    let mut draft = NewTransaction {
        title: input.title.trim().to_string(),
        kind: input.kind,
        value: Money::from_decimal(input.value.as_decimal()),
        category: None,
    };

    // Balance check and insert commit together; an early return rolls back.
    let mut tx = pool.begin().await?;
    tally_storage::get_balance(&mut *tx).await?.authorize(&draft)?;

    draft.category = match input.category.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => {
            Some(tally_storage::upsert_category(&mut *tx, title).await?)
        }
        _ => None,
    };

    let created = tally_storage::insert_transaction(&mut *tx, draft).await?;
    tx.commit().await?;

    tracing::info!(id = %created.id, kind = %created.kind, "Created transaction");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !tally_storage::delete_transaction(state.store.pool(), TransactionId(id)).await? {
        return Err(AppError::NotFound(format!("Transaction {id}")));
    }
    tracing::info!(id, "Deleted transaction");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(tally_storage::get_all_categories(state.store.pool()).await?))
}

/// Stores the uploaded CSV in the upload directory and imports it.
pub async fn import_transactions(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Transaction>>), AppError> {
    let mut stored = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        stored = Some(state.upload.store(&file_name, &data).await?);
        break;
    }

    let path = stored.ok_or_else(|| {
        AppError::BadRequest(format!("Missing multipart field '{IMPORT_FIELD}'"))
    })?;

    let service = ImportService::new(state.store.clone(), state.store.clone());
    let created = service.execute(&path).await?;

    Ok((StatusCode::CREATED, Json(created)))
}
