use super::BaseRepository;
use crate::db::entities::{LocalEntry, LocalEntryActiveModel, LocalEntryModel, local_entries};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use tracing::debug;

/// Scoped key-value storage local to this install
#[async_trait]
pub trait LocalEntryRepository: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key` in `scope`
    async fn get(&self, scope: &str, key: &str) -> Result<Option<LocalEntryModel>>;

    /// Insert or replace the value stored under `key` in `scope`
    async fn put(
        &self,
        scope: &str,
        key: &str,
        value: &str,
        updated_at: NaiveDateTime,
    ) -> Result<()>;

    /// All entries in a scope, most recently updated first
    async fn list_scope(&self, scope: &str) -> Result<Vec<LocalEntryModel>>;

    async fn count_scope(&self, scope: &str) -> Result<u64>;

    /// Delete the oldest entries in `scope` until at most `keep` remain.
    /// Returns the number of rows removed.
    async fn evict_oldest(&self, scope: &str, keep: u64) -> Result<u64>;
}

#[derive(Debug)]
pub struct LocalEntryRepositoryImpl {
    base: BaseRepository,
}

impl LocalEntryRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl LocalEntryRepository for LocalEntryRepositoryImpl {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<LocalEntryModel>> {
        Ok(LocalEntry::find_by_id((scope.to_string(), key.to_string()))
            .one(self.base.db.as_ref())
            .await?)
    }

    async fn put(
        &self,
        scope: &str,
        key: &str,
        value: &str,
        updated_at: NaiveDateTime,
    ) -> Result<()> {
        let active_model = LocalEntryActiveModel {
            scope: Set(scope.to_string()),
            entry_key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(updated_at),
        };

        LocalEntry::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    local_entries::Column::Scope,
                    local_entries::Column::EntryKey,
                ])
                .update_columns([
                    local_entries::Column::Value,
                    local_entries::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(self.base.db.as_ref())
            .await?;

        Ok(())
    }

    async fn list_scope(&self, scope: &str) -> Result<Vec<LocalEntryModel>> {
        Ok(LocalEntry::find()
            .filter(local_entries::Column::Scope.eq(scope))
            .order_by(local_entries::Column::UpdatedAt, Order::Desc)
            .all(self.base.db.as_ref())
            .await?)
    }

    async fn count_scope(&self, scope: &str) -> Result<u64> {
        Ok(LocalEntry::find()
            .filter(local_entries::Column::Scope.eq(scope))
            .count(self.base.db.as_ref())
            .await?)
    }

    async fn evict_oldest(&self, scope: &str, keep: u64) -> Result<u64> {
        let total = self.count_scope(scope).await?;
        if total <= keep {
            return Ok(0);
        }

        let stale_keys: Vec<String> = LocalEntry::find()
            .select_only()
            .column(local_entries::Column::EntryKey)
            .filter(local_entries::Column::Scope.eq(scope))
            .order_by(local_entries::Column::UpdatedAt, Order::Asc)
            .limit(total - keep)
            .into_tuple()
            .all(self.base.db.as_ref())
            .await?;

        let result = LocalEntry::delete_many()
            .filter(local_entries::Column::Scope.eq(scope))
            .filter(local_entries::Column::EntryKey.is_in(stale_keys))
            .exec(self.base.db.as_ref())
            .await?;

        debug!(
            "Evicted {} stale entries from scope {}",
            result.rows_affected, scope
        );
        Ok(result.rows_affected)
    }
}
