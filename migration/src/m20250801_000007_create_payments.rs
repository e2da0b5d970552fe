use sea_orm_migration::{prelude::*, schema::*};

use super::m20250801_000002_create_users::User;
use super::m20250801_000005_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(uuid(Payment::Id).primary_key())
                    .col(uuid(Payment::BookingId).not_null())
                    .col(uuid(Payment::UserId).not_null())
                    .col(string_len(Payment::TransactionId, 64).not_null().unique_key())
                    .col(big_integer(Payment::Amount).not_null())
                    .col(string_len(Payment::Currency, 3).not_null())
                    .col(string_len(Payment::Status, 16).not_null())
                    .col(string_len(Payment::MethodType, 20).not_null())
                    .col(string_len_null(Payment::CardLast4, 4))
                    .col(string_len_null(Payment::ReceiptUrl, 255))
                    .col(
                        timestamp_with_time_zone(Payment::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_booking")
                            .from(Payment::Table, Payment::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_user")
                            .from(Payment::Table, Payment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_booking")
                    .table(Payment::Table)
                    .col(Payment::BookingId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Payment {
    Table,
    Id,
    BookingId,
    UserId,
    TransactionId,
    Amount,
    Currency,
    Status,
    MethodType,
    CardLast4,
    ReceiptUrl,
    CreatedAt,
}
