use std::collections::HashSet;

use color_eyre::{eyre::WrapErr, Result};
use sqlx::SqlitePool;

/// Versioned schema files, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[
    ("V1", include_str!("../../migrations/V1__init.sql")),
    ("V2", include_str!("../../migrations/V2__add_user_settings.sql")),
];

/// Apply every migration not yet recorded in `schema_migrations`, each in its
/// own transaction. Returns how many were applied.
pub async fn run(pool: &SqlitePool) -> Result<usize> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    let applied: HashSet<String> = sqlx::query_scalar("SELECT version FROM schema_migrations")
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    let pending = MIGRATIONS
        .iter()
        .filter(|(version, _)| !applied.contains(*version));

    let mut count = 0;
    for (version, sql) in pending {
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .wrap_err_with(|| format!("migration {version} failed"))?;
        sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(version, "applied database migration");
        count += 1;
    }

    if count == 0 {
        tracing::debug!("database schema is up to date");
    }
    Ok(count)
}
