//! Repository for the `app_config` table.

use sqlx::PgExecutor;

use crate::models::config::ConfigEntry;

/// Provides key/value access to dynamic configuration.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Fetch one value, `None` when the key has no row.
    pub async fn get<'e>(
        exec: impl PgExecutor<'e>,
        key: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT value FROM app_config WHERE key = $1")
            .bind(key)
            .fetch_optional(exec)
            .await
    }

    /// Upsert one value.
    pub async fn set<'e>(
        exec: impl PgExecutor<'e>,
        key: &str,
        value: &str,
    ) -> Result<ConfigEntry, sqlx::Error> {
        sqlx::query_as::<_, ConfigEntry>(
            "INSERT INTO app_config (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING key, value, updated_at",
        )
        .bind(key)
        .bind(value)
        .fetch_one(exec)
        .await
    }
}
