use sea_orm_migration::{prelude::*, schema::*};

use super::m20250801_000005_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Passenger::Table)
                    .if_not_exists()
                    .col(uuid(Passenger::Id).primary_key())
                    .col(uuid(Passenger::BookingId).not_null())
                    .col(string_len(Passenger::FullName, 150).not_null())
                    .col(string_len(Passenger::Gender, 10).not_null())
                    .col(date(Passenger::Birthdate).not_null())
                    .col(string_len(Passenger::PassportNumber, 12).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_passenger_booking")
                            .from(Passenger::Table, Passenger::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Passenger::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Passenger {
    Table,
    Id,
    BookingId,
    FullName,
    Gender,
    Birthdate,
    PassportNumber,
}
