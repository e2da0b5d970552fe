use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Admin::Table)
                    .if_not_exists()
                    .col(uuid(Admin::Id).primary_key())
                    .col(string_len(Admin::Username, 50).not_null().unique_key())
                    .col(string_len(Admin::Email, 255).not_null().unique_key())
                    .col(string_len(Admin::PasswordHash, 255).not_null())
                    .col(string_len_null(Admin::Name, 100))
                    .col(boolean(Admin::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone_null(Admin::LastLogin))
                    .col(
                        timestamp_with_time_zone(Admin::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Admin::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Admin {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Name,
    IsActive,
    LastLogin,
    CreatedAt,
}
