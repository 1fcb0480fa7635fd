//! Persistence layer: durable keyed storage of tokens and pools.
//!
//! [`Store`] is the only cross-cycle shared resource. Writes are upserts
//! keyed by primary id: existing rows are overwritten, never diffed. The
//! PostgreSQL implementation uses `sqlx::PgPool`; the in-memory one backs
//! tests and deployments with persistence disabled.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{Pool, Token};
use crate::error::OracleError;

/// Durable token and pool storage.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Looks up one token by account.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] on storage failure.
    async fn find_token(&self, id: &str) -> Result<Option<Token>, OracleError>;

    /// Returns every stored token ordered by account.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] on storage failure.
    async fn find_all_tokens(&self) -> Result<Vec<Token>, OracleError>;

    /// Inserts or overwrites the given tokens.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] on storage failure.
    async fn upsert_tokens(&self, tokens: &[Token]) -> Result<(), OracleError>;

    /// Returns every stored pool ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] on storage failure.
    async fn find_all_pools(&self) -> Result<Vec<Pool>, OracleError>;

    /// Inserts or overwrites the given pools.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] on storage failure.
    async fn upsert_pools(&self, pools: &[Pool]) -> Result<(), OracleError>;

    /// Writes one cycle's tokens and pools. Implementations that support
    /// transactions commit both sets atomically.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] on storage failure.
    async fn save_batch(&self, tokens: &[Token], pools: &[Pool]) -> Result<(), OracleError> {
        self.upsert_tokens(tokens).await?;
        self.upsert_pools(pools).await
    }
}
