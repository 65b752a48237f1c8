//! Dynamic configuration rows.

use serde::Serialize;
use sqlx::FromRow;

use flipline_core::types::Timestamp;

/// One tunable: a key/value pair with its last update time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: Timestamp,
}
