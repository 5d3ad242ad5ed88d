use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseConnection as SeaOrmConnection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub type DatabaseConnection = Arc<SeaOrmConnection>;

/// Local SQLite store backing the guest and mirror progress entries
#[derive(Debug)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect to a specific database path, creating it when missing
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        info!("Connecting to progress store at: {}", db_url);

        let mut opt = ConnectOptions::new(db_url);
        opt.max_connections(4)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let connection = SeaOrmDatabase::connect(opt)
            .await
            .context("Failed to connect to database")?;

        use sea_orm::{ConnectionTrait, Statement};
        // Periodic writes must not block readers
        connection
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "PRAGMA journal_mode = WAL",
            ))
            .await
            .context("Failed to enable WAL mode")?;

        debug!("Progress store connection ready");

        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    /// Connect and bring the schema up to date in one step
    pub async fn open(path: &Path) -> Result<Self> {
        let db = Self::connect(path).await?;
        db.migrate().await?;
        Ok(db)
    }

    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Default database path under the user's data directory
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Ok(data_dir.join("madifa").join("progress.db"))
    }

    pub async fn migrate(&self) -> Result<()> {
        use crate::db::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        let pending_count = Migrator::get_pending_migrations(&*self.connection)
            .await
            .context("Failed to get pending migrations")?
            .len();

        if pending_count > 0 {
            info!("Applying {} progress store migrations", pending_count);
            Migrator::up(&*self.connection, None)
                .await
                .context("Failed to run migrations")?;
        } else {
            debug!("No pending migrations to apply");
        }

        Ok(())
    }
}
