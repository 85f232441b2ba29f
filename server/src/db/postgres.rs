//! PostgreSQL-backed snapshot documents.

use super::{DocumentStore, SnapshotDocument};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

impl<'r> sqlx::FromRow<'r, PgRow> for SnapshotDocument {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(SnapshotDocument {
            doc_id: row.try_get("doc_id")?,
            instance_id: row.try_get("instance_id")?,
            raw: row.try_get("raw")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Snapshot documents stored in the `bracket_data` table.
#[derive(Debug, Clone)]
pub struct PgDocuments {
    pool: PgPool,
}

impl PgDocuments {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DocumentStore for PgDocuments {
    async fn find(&self, instance_id: &str) -> Result<Option<SnapshotDocument>> {
        let document = sqlx::query_as::<_, SnapshotDocument>(
            r#"
            SELECT doc_id, instance_id, raw, updated_at
            FROM bracket_data
            WHERE instance_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn create(&self, instance_id: &str, raw: &str) -> Result<SnapshotDocument> {
        let doc_id = uuid::Uuid::new_v4().to_string();

        let document = sqlx::query_as::<_, SnapshotDocument>(
            r#"
            INSERT INTO bracket_data (doc_id, instance_id, raw)
            VALUES ($1, $2, $3)
            RETURNING doc_id, instance_id, raw, updated_at
            "#,
        )
        .bind(&doc_id)
        .bind(instance_id)
        .bind(raw)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    async fn write(&self, doc_id: &str, raw: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bracket_data
            SET raw = $2, updated_at = now()
            WHERE doc_id = $1
            "#,
        )
        .bind(doc_id)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(doc_id.to_string()));
        }

        Ok(())
    }
}
