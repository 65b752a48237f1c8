//! Ledger collaborator contract: aggregated open commitments.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use flipline_db::repositories::LedgerRepo;

use crate::error::PipelineError;

/// Source of the open-commitments aggregate the cash gate reads.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Sum of financial commitments not yet actualized.
    async fn open_commitments(&self) -> Result<Decimal, PipelineError>;
}

/// Production provider summing open rows in `ledger_entries`.
pub struct DbLedgerProvider {
    pool: PgPool,
}

impl DbLedgerProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerProvider for DbLedgerProvider {
    async fn open_commitments(&self) -> Result<Decimal, PipelineError> {
        Ok(LedgerRepo::open_total(&self.pool).await?)
    }
}
