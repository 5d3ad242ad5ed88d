pub mod mocks;

use madifa_progress::db::Database;
use madifa_progress::db::repository::{LocalEntryRepository, LocalEntryRepositoryImpl};
use madifa_progress::{IdentityProvider, RemoteProgressStore, WatchProgressSync};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// One simulated install: its own on-disk store in a temp dir
pub struct TestDevice {
    pub db_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestDevice {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            db_path: temp_dir.path().join("progress.db"),
            _temp_dir: temp_dir,
        }
    }

    /// Open (or reopen, like a page reload) the local store
    pub async fn local(&self) -> Arc<dyn LocalEntryRepository> {
        let db = Database::open(&self.db_path)
            .await
            .expect("Failed to open test database");
        Arc::new(LocalEntryRepositoryImpl::new(db.get_connection()))
    }

    pub async fn sync(&self, identity: Arc<dyn IdentityProvider>) -> WatchProgressSync {
        WatchProgressSync::new(self.local().await, identity)
    }

    pub async fn sync_with_remote(
        &self,
        identity: Arc<dyn IdentityProvider>,
        remote: Arc<dyn RemoteProgressStore>,
    ) -> WatchProgressSync {
        self.sync(identity).await.with_remote(remote)
    }
}

pub async fn tick() {
    // Keeps updated_at strictly increasing between writes
    tokio::time::sleep(std::time::Duration::from_millis(15)).await;
}
