use sea_orm_migration::{prelude::*, schema::*};

use super::m20250801_000002_create_users::User;
use super::m20250801_000004_create_flights::Flight;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::UserId).not_null())
                    .col(uuid_null(Booking::FlightId))
                    .col(string_len(Booking::FlightNumber, 20).not_null())
                    .col(string_len(Booking::DepartureCity, 150).not_null())
                    .col(string_len(Booking::ArrivalCity, 150).not_null())
                    .col(date(Booking::FlightDate).not_null())
                    .col(time_null(Booking::DepartureTime))
                    .col(time_null(Booking::ArrivalTime))
                    .col(big_integer(Booking::Amount).not_null())
                    .col(string_len(Booking::Currency, 3).not_null().default("INR"))
                    .col(
                        string_len(Booking::Status, 16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::BookingDate)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_flight")
                            .from(Booking::Table, Booking::FlightId)
                            .to(Flight::Table, Flight::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_user")
                    .table(Booking::Table)
                    .col(Booking::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    UserId,
    FlightId,
    FlightNumber,
    DepartureCity,
    ArrivalCity,
    FlightDate,
    DepartureTime,
    ArrivalTime,
    Amount,
    Currency,
    Status,
    BookingDate,
}
