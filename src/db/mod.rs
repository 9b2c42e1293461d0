// Database module - provides data access layer

use std::str::FromStr;

use color_eyre::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

// Re-export models for convenience
pub mod models;
pub use models::*;

// Internal modules
mod assessment;
mod content;
mod migrations;
mod progress;
mod settings;
mod user;

pub use settings::{NotificationUpdate, PrivacyUpdate};

// Main database handle
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Connect to a SQLite database (e.g. `sqlite:fluentpath.db`), creating
    /// the file if needed, and bring its schema up to date.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // Verify connection
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
        color_eyre::eyre::ensure!(one == 1, "connection check failed");

        migrations::run(&pool).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { pool })
    }

    pub async fn migration_applied(&self, version: &str) -> Result<bool> {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)",
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;

        Ok(applied)
    }
}
