//! PostgreSQL client implementation
//!
//! Connection pooling, statement timeouts and schema bootstrap shared by all
//! PostgreSQL-backed repositories.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{AnonymizerError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Schema of the checkpoint table
const CHECKPOINT_MIGRATION: &str = include_str!("../../../migrations/001_checkpoints.sql");

/// PostgreSQL client
///
/// Provides methods for connecting to PostgreSQL and running statements using
/// connection pooling.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the first statement runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool cannot
    /// be created.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config = config
            .connection_string
            .expose_secret()
            .parse::<tokio_postgres::Config>()
            .map_err(|e| {
                AnonymizerError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;
        pg_config.ssl_mode(ssl_mode(&config.ssl_mode));

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = if config.uses_tls() {
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(!config.ssl_mode.starts_with("verify"))
                .build()
                .map_err(|e| {
                    AnonymizerError::Configuration(format!("Failed to create TLS connector: {e}"))
                })?;
            Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
        } else {
            Manager::from_config(pg_config, NoTls, manager_config)
        };

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                AnonymizerError::Database(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| AnonymizerError::Database(format!("Connection test failed: {e}")))?;

        tracing::info!(database = %self.connection_string_safe(), "PostgreSQL connection test successful");
        Ok(())
    }

    /// Create the checkpoint table and its index if they don't exist
    pub async fn ensure_checkpoint_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(CHECKPOINT_MIGRATION)
            .await
            .map_err(|e| AnonymizerError::Database(format!("Failed to execute migration: {e}")))?;

        tracing::debug!("Checkpoint schema initialized");
        Ok(())
    }

    /// Whether the checkpoint table exists, without creating it
    pub async fn checkpoint_table_exists(&self) -> Result<bool> {
        let client = self.get_connection().await?;

        let row = client
            .query_one(
                "SELECT to_regclass('anonymization_checkpoints') IS NOT NULL AS present",
                &[],
            )
            .await
            .map_err(|e| AnonymizerError::Database(format!("Checkpoint table lookup failed: {e}")))?;
        Ok(row.try_get("present")?)
    }

    /// Get a connection from the pool with the statement timeout applied
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self.pool.get().await.map_err(|e| {
            AnonymizerError::Database(format!("Failed to get connection from pool: {e}"))
        })?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.batch_execute(&timeout_query).await.map_err(|e| {
            AnonymizerError::Database(format!("Failed to set statement timeout: {e}"))
        })?;

        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;

        client
            .query(query, params)
            .await
            .map_err(|e| AnonymizerError::Database(format!("Query failed: {e}")))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.get_connection().await?;

        client
            .execute(statement, params)
            .await
            .map_err(|e| AnonymizerError::Database(format!("Statement execution failed: {e}")))
    }

    pub fn config(&self) -> &PostgreSQLConfig {
        &self.config
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> String {
        self.config
            .connection_string
            .expose_secret()
            .after_credentials()
            .map(|rest| format!("postgresql://***@{rest}"))
            .unwrap_or_else(|| "postgresql://***".to_string())
    }
}

fn ssl_mode(name: &str) -> SslMode {
    match name {
        "disable" => SslMode::Disable,
        "require" | "verify-ca" | "verify-full" => SslMode::Require,
        _ => SslMode::Prefer,
    }
}

/// Quotes an identifier that already passed identifier validation
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
