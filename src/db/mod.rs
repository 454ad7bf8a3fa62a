//! Database module providing connection management, migrations, and queries.

pub mod commit_files;
pub mod commits;
pub mod repos;
pub mod store;
pub mod users;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

pub use store::{CommitContext, CommitFileStore, RepoStore};

/// Database connection pool wrapper.
///
/// `DatabaseConnection` is itself a pooled, cloneable handle, so the wrapper
/// only carries it around and hangs the query methods off one type.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let mut opts = ConnectOptions::new(config.database.url.clone());
        opts.max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        DbPool { conn }
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        let pending = Migrator::get_pending_migrations(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read migrations: {}", e)))?;
        info!("{} migration(s) pending", pending.len());

        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))
    }

    /// Round-trip to the database for the readiness check.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }
}
