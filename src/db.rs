//! PostgreSQL connection handling.
//!
//! [`Database`] owns the pool for the whole process. It is created once in `main`,
//! cloned into the repositories, and closed with [`Database::shutdown`] after the
//! HTTP server stops.

use std::time::Duration;

use log::{debug, error, info};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;

use crate::config::DatabaseConfig;

/// Overflow connections idle for longer than this are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections())
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(IDLE_TIMEOUT)
}

impl Database {
    /// Opens the pool and verifies the server answers.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!(
            "Connecting to postgres at {}:{}/{} (pool {} + overflow {})",
            config.host, config.port, config.name, config.pool_size, config.max_overflow
        );
        let pool = pool_options(config)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                e
            })?;

        let db = Self { pool };
        db.ping().await?;
        info!("Database connection pool created");
        Ok(db)
    }

    /// Builds the pool without opening any connection until first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        Self {
            pool: pool_options(config).connect_lazy_with(config.connect_options()),
        }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A single connection checked out of the pool; it goes back when dropped.
    pub async fn acquire_session(&self) -> Result<PoolConnection<Postgres>, sqlx::Error> {
        self.pool.acquire().await
    }

    /// Applies pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations complete");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        debug!("Performing database health check");
        let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        if one != 1 {
            return Err(sqlx::Error::Protocol(format!(
                "health check returned {}",
                one
            )));
        }
        Ok(())
    }

    /// Closes every connection; later acquires fail.
    pub async fn shutdown(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
