//! Database seeding utilities.

use std::collections::BTreeMap;

use foundry::{FoundryError, StoredRecord};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Factory error: {0}")]
    Factory(#[from] FoundryError),
}

/// Database seeder for flushing factory-built records into PostgreSQL.
///
/// Records land in a single `fixtures` table keyed by model and id, with the
/// object itself stored as JSONB.
pub struct Seeder {
    pool: PgPool,
    batch_size: usize,
}

impl Seeder {
    /// Creates a new seeder with the given database pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: 50,
        }
    }

    /// Sets the batch size for bulk operations.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Creates the fixtures table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), SeedError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fixtures (
                model TEXT NOT NULL,
                id UUID NOT NULL,
                data JSONB NOT NULL,
                seeded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (model, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seeds records in insertion order, one transaction per batch.
    pub async fn seed_records(&self, records: &[StoredRecord]) -> Result<(), SeedError> {
        info!("Seeding {} records...", records.len());

        for (i, chunk) in records.chunks(self.batch_size).enumerate() {
            self.insert_batch(chunk).await?;
            info!(
                "  Seeded {}/{} records",
                i * self.batch_size + chunk.len(),
                records.len()
            );
        }

        for (model, count) in count_by_model(records) {
            info!("Seeded {count} {model} records");
        }
        Ok(())
    }

    /// Inserts a batch of records, overwriting earlier seeds of the same id.
    async fn insert_batch(&self, records: &[StoredRecord]) -> Result<(), SeedError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO fixtures (model, id, data, seeded_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (model, id) DO UPDATE SET
                    data = EXCLUDED.data,
                    seeded_at = EXCLUDED.seeded_at
                "#,
            )
            .bind(&record.model)
            .bind(record.id)
            .bind(&record.data)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes every seeded record of `model`.
    pub async fn purge_model(&self, model: &str) -> Result<u64, SeedError> {
        let result = sqlx::query("DELETE FROM fixtures WHERE model = $1")
            .bind(model)
            .execute(&self.pool)
            .await?;

        info!("Purged {} {model} records", result.rows_affected());
        Ok(result.rows_affected())
    }
}

/// Record counts per model.
pub fn count_by_model(records: &[StoredRecord]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.model.as_str()).or_insert(0) += 1;
    }
    counts
}
