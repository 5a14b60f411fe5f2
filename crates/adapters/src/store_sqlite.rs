//! SQLite subscriber store implementation

use async_trait::async_trait;
use postman_domain::{StoreError, Subscriber, SubscriberStore};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;

/// SQLite-backed subscriber store
pub struct SqliteSubscriberStore {
    pool: SqlitePool,
}

impl SqliteSubscriberStore {
    /// Create a new SQLite store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        tracing::debug!(path = %db_path.display(), "Opened subscriber database");

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriber (
                id INTEGER NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                subscribed_date TEXT NOT NULL,
                PRIMARY KEY (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for SqliteSubscriberStore {
    async fn select_all_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, email, subscribed_date FROM subscriber ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(id, email, subscribed_date)| {
                let id = i32::try_from(id).map_err(|_| {
                    StoreError::Corrupt(format!("id {} for {} is out of range", id, email))
                })?;
                Ok(Subscriber::restore(id, email, subscribed_date))
            })
            .collect()
    }

    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO subscriber (id, email, subscribed_date) VALUES (?, ?, ?)")
            .bind(subscriber.id)
            .bind(&subscriber.email)
            .bind(&subscriber.subscribed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::Duplicate {
                        id: subscriber.id,
                        email: subscriber.email.clone(),
                    }
                }
                other => StoreError::Database(other.to_string()),
            })?;

        Ok(())
    }

    async fn remove_subscriber_by_id(&self, id: i32) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM subscriber WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}
