//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use super::Store;
use super::models::{PoolRow, TokenRow};
use crate::config::OracleConfig;
use crate::domain::{Pool, Token};
use crate::error::OracleError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] if the database is unreachable.
    pub async fn connect(config: &OracleConfig) -> Result<Self, OracleError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), OracleError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OracleError::Persistence(e.to_string()))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn find_token(&self, id: &str) -> Result<Option<Token>, OracleError> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT id, decimals, symbol, price, updated_at FROM token WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Token::try_from).transpose()
    }

    async fn find_all_tokens(&self) -> Result<Vec<Token>, OracleError> {
        let rows = sqlx::query_as::<_, TokenRow>(
            "SELECT id, decimals, symbol, price, updated_at FROM token ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Token::try_from).collect()
    }

    async fn upsert_tokens(&self, tokens: &[Token]) -> Result<(), OracleError> {
        let mut conn = self.pool.acquire().await?;
        upsert_token_rows(&mut *conn, tokens).await
    }

    async fn find_all_pools(&self) -> Result<Vec<Pool>, OracleError> {
        let rows = sqlx::query_as::<_, PoolRow>(
            "SELECT id, token_first, token_second, volume_first, volume_second, \
             volume24h_first, volume24h_second, updated_at \
             FROM pool ORDER BY id::BIGINT",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Pool::try_from).collect()
    }

    async fn upsert_pools(&self, pools: &[Pool]) -> Result<(), OracleError> {
        let mut conn = self.pool.acquire().await?;
        upsert_pool_rows(&mut *conn, pools).await
    }

    async fn save_batch(&self, tokens: &[Token], pools: &[Pool]) -> Result<(), OracleError> {
        let mut tx = self.pool.begin().await?;
        upsert_token_rows(&mut *tx, tokens).await?;
        upsert_pool_rows(&mut *tx, pools).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Upserts all tokens with a single `UNNEST` statement.
async fn upsert_token_rows(conn: &mut PgConnection, tokens: &[Token]) -> Result<(), OracleError> {
    if tokens.is_empty() {
        return Ok(());
    }
    let rows: Vec<TokenRow> = tokens.iter().map(TokenRow::from).collect();
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let decimals: Vec<i32> = rows.iter().map(|r| r.decimals).collect();
    let symbols: Vec<String> = rows.iter().map(|r| r.symbol.clone()).collect();
    let prices: Vec<String> = rows.iter().map(|r| r.price.clone()).collect();
    let updated: Vec<DateTime<Utc>> = rows.iter().map(|r| r.updated_at).collect();

    sqlx::query(
        "INSERT INTO token (id, decimals, symbol, price, updated_at) \
         SELECT * FROM UNNEST($1::VARCHAR[], $2::INT[], $3::VARCHAR[], $4::VARCHAR[], $5::TIMESTAMPTZ[]) \
         ON CONFLICT (id) DO UPDATE SET \
             decimals = EXCLUDED.decimals, \
             symbol = EXCLUDED.symbol, \
             price = EXCLUDED.price, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(ids)
    .bind(decimals)
    .bind(symbols)
    .bind(prices)
    .bind(updated)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Upserts all pools with a single `UNNEST` statement.
async fn upsert_pool_rows(conn: &mut PgConnection, pools: &[Pool]) -> Result<(), OracleError> {
    if pools.is_empty() {
        return Ok(());
    }
    let rows: Vec<PoolRow> = pools.iter().map(PoolRow::from).collect();
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let firsts: Vec<String> = rows.iter().map(|r| r.token_first.clone()).collect();
    let seconds: Vec<String> = rows.iter().map(|r| r.token_second.clone()).collect();
    let reserves_first: Vec<String> = rows.iter().map(|r| r.volume_first.clone()).collect();
    let reserves_second: Vec<String> = rows.iter().map(|r| r.volume_second.clone()).collect();
    let volumes_first: Vec<String> = rows.iter().map(|r| r.volume24h_first.clone()).collect();
    let volumes_second: Vec<String> = rows.iter().map(|r| r.volume24h_second.clone()).collect();
    let updated: Vec<DateTime<Utc>> = rows.iter().map(|r| r.updated_at).collect();

    sqlx::query(
        "INSERT INTO pool (id, token_first, token_second, volume_first, volume_second, \
                           volume24h_first, volume24h_second, updated_at) \
         SELECT * FROM UNNEST($1::VARCHAR[], $2::VARCHAR[], $3::VARCHAR[], $4::VARCHAR[], \
                              $5::VARCHAR[], $6::VARCHAR[], $7::VARCHAR[], $8::TIMESTAMPTZ[]) \
         ON CONFLICT (id) DO UPDATE SET \
             token_first = EXCLUDED.token_first, \
             token_second = EXCLUDED.token_second, \
             volume_first = EXCLUDED.volume_first, \
             volume_second = EXCLUDED.volume_second, \
             volume24h_first = EXCLUDED.volume24h_first, \
             volume24h_second = EXCLUDED.volume24h_second, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(ids)
    .bind(firsts)
    .bind(seconds)
    .bind(reserves_first)
    .bind(reserves_second)
    .bind(volumes_first)
    .bind(volumes_second)
    .bind(updated)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
