use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Executor, Pool, QueryBuilder, Sqlite};
use std::path::Path;
use std::time::Duration;
use tally_core::{
    Balance, Category, CategoryId, Money, NewTransaction, Transaction, TransactionId,
    TransactionType,
};

pub type DbPool = Pool<Sqlite>;

/// Titles bound per `IN (...)` lookup, well below SQLite's host-parameter limit.
const TITLE_LOOKUP_CHUNK: usize = 500;

type TransactionRow = (i64, String, String, i64, Option<i64>, Option<String>);

const SELECT_TRANSACTIONS: &str = r#"
    SELECT t.id, t.title, t.type, t.value_cents, c.id, c.title
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'outcome')),
            value_cents INTEGER NOT NULL,
            category_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (category_id) REFERENCES categories(id)
                ON UPDATE CASCADE ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn transaction_from_row(r: TransactionRow) -> Result<Transaction, sqlx::Error> {
    let kind = r
        .2
        .parse::<TransactionType>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let category = match (r.4, r.5) {
        (Some(id), Some(title)) => Some(Category {
            id: CategoryId(id),
            title,
        }),
        _ => None,
    };
    Ok(Transaction {
        id: TransactionId(r.0),
        title: r.1,
        kind,
        value: Money::from_cents(r.3),
        category,
    })
}

pub async fn get_all_categories(pool: &DbPool) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, title FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, title)| Category {
            id: CategoryId(id),
            title,
        })
        .collect())
}

pub async fn get_categories_by_titles(
    pool: &DbPool,
    titles: &[String],
) -> Result<Vec<Category>, sqlx::Error> {
    let mut found = Vec::new();

    for chunk in titles.chunks(TITLE_LOOKUP_CHUNK) {
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT id, title FROM categories WHERE title IN (");
        let mut separated = query.separated(", ");
        for title in chunk {
            separated.push_bind(title);
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<(i64, String)>()
            .fetch_all(pool)
            .await?;
        found.extend(rows.into_iter().map(|(id, title)| Category {
            id: CategoryId(id),
            title,
        }));
    }

    found.sort_by_key(|c| c.id.0);
    Ok(found)
}

/// Inserts `title`, or resolves to the stored row when it already exists.
///
/// Two writers racing on the same new name end up sharing one category.
pub async fn upsert_category<'e, E>(executor: E, title: &str) -> Result<Category, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (id, title) = sqlx::query_as::<_, (i64, String)>(
        r#"
        INSERT INTO categories (title) VALUES (?)
        ON CONFLICT(title) DO UPDATE SET title = excluded.title
        RETURNING id, title
        "#,
    )
    .bind(title)
    .fetch_one(executor)
    .await?;

    Ok(Category {
        id: CategoryId(id),
        title,
    })
}

/// Upserts one category per title inside a single database transaction.
pub async fn insert_categories(
    pool: &DbPool,
    titles: &[String],
) -> Result<Vec<Category>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(titles.len());

    for title in titles {
        created.push(upsert_category(&mut *tx, title).await?);
    }

    tx.commit().await?;
    Ok(created)
}

pub async fn find_or_create_category(pool: &DbPool, title: &str) -> Result<Category, sqlx::Error> {
    upsert_category(pool, title).await
}

pub async fn insert_transaction<'e, E>(
    executor: E,
    draft: NewTransaction,
) -> Result<Transaction, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (id,) = sqlx::query_as::<_, (i64,)>(
        "INSERT INTO transactions (title, type, value_cents, category_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&draft.title)
    .bind(draft.kind.as_str())
    .bind(draft.value.to_cents())
    .bind(draft.category.as_ref().map(|c| c.id.0))
    .fetch_one(executor)
    .await?;

    Ok(Transaction::from_new(TransactionId(id), draft))
}

pub async fn insert_transactions(
    pool: &DbPool,
    drafts: Vec<NewTransaction>,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(drafts.len());

    for draft in drafts {
        created.push(insert_transaction(&mut *tx, draft).await?);
    }

    tx.commit().await?;
    Ok(created)
}

pub async fn get_all_transactions(pool: &DbPool) -> Result<Vec<Transaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!("{SELECT_TRANSACTIONS} ORDER BY t.id"))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(transaction_from_row).collect()
}

pub async fn get_transaction(
    pool: &DbPool,
    id: TransactionId,
) -> Result<Option<Transaction>, sqlx::Error> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!("{SELECT_TRANSACTIONS} WHERE t.id = ?"))
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    row.map(transaction_from_row).transpose()
}

/// Returns `false` when no such transaction exists.
pub async fn delete_transaction(pool: &DbPool, id: TransactionId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_balance<'e, E>(executor: E) -> Result<Balance, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (income, outcome) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN value_cents END), 0),
            COALESCE(SUM(CASE WHEN type = 'outcome' THEN value_cents END), 0)
        FROM transactions
        "#,
    )
    .fetch_one(executor)
    .await?;

    Ok(Balance::new(Money::from_cents(income), Money::from_cents(outcome)))
}
