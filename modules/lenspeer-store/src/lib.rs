pub mod error;

pub use error::{Result, StoreError};

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use lenspeer_common::{ContactRecord, DeliveryContext, WalletItem};

/// SQLite persistence for contact records and wallet reference data.
///
/// All writes are idempotent: contact inserts and wallet upserts ignore
/// existing keys, so replaying a partially completed cycle cannot duplicate
/// rows. `insert_if_absent` is a single statement, so an `exists` check that
/// runs after it returns success always sees the row.
#[derive(Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

/// A row from the contact_records table.
#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    profile_id: String,
    handle: String,
    display_name: String,
    followers: i64,
    following: i64,
    interest_count: i64,
    delivery_context: String,
    priority_score: f64,
    first_seen_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl ContactRow {
    fn into_record(self) -> Result<ContactRecord> {
        let delivery_context: DeliveryContext = serde_json::from_str(&self.delivery_context)
            .map_err(|source| StoreError::CorruptRecord {
                profile_id: self.profile_id.clone(),
                source,
            })?;
        Ok(ContactRecord {
            profile_id: self.profile_id,
            handle: self.handle,
            display_name: self.display_name,
            followers: self.followers as u32,
            following: self.following as u32,
            interest_count: self.interest_count as u32,
            delivery_context,
            priority_score: self.priority_score,
            first_seen_at: self.first_seen_at,
            delivered_at: self.delivered_at,
        })
    }
}

impl ContactStore {
    /// Open the database and run migrations. The pool is capped at one
    /// connection: the store has a single writer, and this keeps
    /// `sqlite::memory:` databases coherent in tests.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// True iff a contact record with this key is present.
    pub async fn exists(&self, profile_id: &str) -> Result<bool> {
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM contact_records WHERE profile_id = ?1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Persist a record unless its key already exists. First write wins.
    /// Returns whether a row was written.
    pub async fn insert_if_absent(&self, record: &ContactRecord) -> Result<bool> {
        let delivery_context = serde_json::to_string(&record.delivery_context)
            .map_err(|source| StoreError::CorruptRecord {
                profile_id: record.profile_id.clone(),
                source,
            })?;

        let result = sqlx::query(
            r#"
            INSERT INTO contact_records
                (profile_id, handle, display_name, followers, following,
                 interest_count, delivery_context, priority_score,
                 first_seen_at, delivered_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(profile_id) DO NOTHING
            "#,
        )
        .bind(&record.profile_id)
        .bind(&record.handle)
        .bind(&record.display_name)
        .bind(record.followers as i64)
        .bind(record.following as i64)
        .bind(record.interest_count as i64)
        .bind(&delivery_context)
        .bind(record.priority_score)
        .bind(record.first_seen_at)
        .bind(record.delivered_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All contact records, highest priority first. Ties keep insertion order.
    pub async fn list_all(&self) -> Result<Vec<ContactRecord>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT * FROM contact_records
            ORDER BY priority_score DESC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContactRow::into_record).collect()
    }

    /// Contact records with no confirmed delivery, highest priority first.
    pub async fn list_undelivered(&self) -> Result<Vec<ContactRecord>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT * FROM contact_records
            WHERE delivered_at IS NULL
            ORDER BY priority_score DESC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContactRow::into_record).collect()
    }

    /// Record the first confirmed delivery. Later confirmations keep the
    /// original timestamp.
    pub async fn mark_delivered(&self, profile_id: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE contact_records
            SET delivered_at = ?1
            WHERE profile_id = ?2 AND delivered_at IS NULL
            "#,
        )
        .bind(at)
        .bind(profile_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Idempotent bulk insert of wallet reference items. Existing ids are
    /// left untouched. Returns how many rows were actually written.
    pub async fn upsert_wallets(&self, wallets: &[WalletItem]) -> Result<u64> {
        let mut written = 0u64;
        for wallet in wallets {
            let chains = serde_json::to_string(&wallet.chains)
                .map_err(|source| StoreError::CorruptRecord {
                    profile_id: wallet.id.clone(),
                    source,
                })?;
            let result = sqlx::query(
                r#"
                INSERT INTO wallets
                    (id, name, homepage, image_id, mobile_link, desktop_link, chains)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(&wallet.id)
            .bind(&wallet.name)
            .bind(&wallet.homepage)
            .bind(&wallet.image_id)
            .bind(&wallet.mobile_link)
            .bind(&wallet.desktop_link)
            .bind(&chains)
            .execute(&self.pool)
            .await?;
            written += result.rows_affected();
        }
        if written > 0 {
            info!(written, total = wallets.len(), "Stored wallet reference items");
        }
        Ok(written)
    }

    /// All cached wallet items in insertion order.
    pub async fn list_wallets(&self) -> Result<Vec<WalletItem>> {
        let rows = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(WalletRow::into_item).collect()
    }

    /// Destructively clear all state. Recovery only, never part of a cycle.
    pub async fn reset(&self) -> Result<()> {
        sqlx::query("DELETE FROM contact_records")
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM wallets")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: String,
    name: String,
    homepage: String,
    image_id: String,
    mobile_link: Option<String>,
    desktop_link: Option<String>,
    chains: String,
}

impl WalletRow {
    fn into_item(self) -> Result<WalletItem> {
        let chains: Vec<String> = serde_json::from_str(&self.chains)
            .map_err(|source| StoreError::CorruptRecord {
                profile_id: self.id.clone(),
                source,
            })?;
        Ok(WalletItem {
            id: self.id,
            name: self.name,
            homepage: self.homepage,
            image_id: self.image_id,
            mobile_link: self.mobile_link,
            desktop_link: self.desktop_link,
            chains,
        })
    }
}
