//! PostgreSQL Backend - shared durable storage for player documents
//!
//! Uses `sqlx` with a connection pool. Upserts merge the patch into the
//! stored JSONB body server-side (`body || patch`), so concurrent writers of
//! different fields never clobber each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info};

use super::backend::{BackendError, BackendResult, DocumentPatch, DurableBackend};
use super::migrations;

#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    key: String,
    body: Json<Value>,
    #[allow(dead_code)]
    updated_at: Option<DateTime<Utc>>,
}

impl PostgresBackend {
    /// Connect to PostgreSQL and run migrations
    pub async fn new(database_url: &str, max_connections: u32) -> BackendResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("PostgreSQL connected (max_connections={})", max_connections);

        let backend = Self { pool };
        backend.run_migrations().await?;

        Ok(backend)
    }

    /// Wrap an existing pool (tests)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> BackendResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name VARCHAR(100) PRIMARY KEY,
                applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;

        for (name, sql) in migrations::get_migrations() {
            let applied: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = $1)")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;

            if !applied {
                info!("Running migration: {}", name);
                sqlx::raw_sql(sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| BackendError::Migration(format!("{}: {}", name, e)))?;

                sqlx::query("INSERT INTO _migrations (name) VALUES ($1)")
                    .bind(name)
                    .execute(&self.pool)
                    .await?;

                info!("Migration applied: {}", name);
            } else {
                debug!("Migration already applied: {}", name);
            }
        }

        Ok(())
    }

    /// Remove every document of a collection (test cleanup)
    pub async fn clear_collection(&self, collection: &str) -> BackendResult<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DurableBackend for PostgresBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn upsert(&self, collection: &str, key: &str, patch: &DocumentPatch) -> BackendResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, key, body, updated_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (collection, key)
             DO UPDATE SET body = documents.body || EXCLUDED.body, updated_at = NOW()",
        )
        .bind(collection)
        .bind(key)
        .bind(Json(patch))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_all(&self, collection: &str) -> BackendResult<Vec<(String, Value)>> {
        let rows: Vec<DocumentRow> =
            sqlx::query_as("SELECT key, body, updated_at FROM documents WHERE collection = $1")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|row| (row.key, row.body.0)).collect())
    }
}
