use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LocalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LocalEntries::Scope).string().not_null())
                    .col(ColumnDef::new(LocalEntries::EntryKey).string().not_null())
                    .col(ColumnDef::new(LocalEntries::Value).text().not_null())
                    .col(
                        ColumnDef::new(LocalEntries::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(LocalEntries::Scope)
                            .col(LocalEntries::EntryKey),
                    )
                    .to_owned(),
            )
            .await?;

        // Eviction and "continue watching" both walk a scope newest/oldest first
        manager
            .create_index(
                Index::create()
                    .name("idx_local_entries_scope_updated")
                    .table(LocalEntries::Table)
                    .col(LocalEntries::Scope)
                    .col(LocalEntries::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LocalEntries::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LocalEntries {
    Table,
    Scope,
    EntryKey,
    Value,
    UpdatedAt,
}
