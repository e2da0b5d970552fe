use sea_orm_migration::{prelude::*, schema::*};

use super::m20250801_000001_create_reference_data::Airplane;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flight::Table)
                    .if_not_exists()
                    .col(uuid(Flight::Id).primary_key())
                    .col(string_len(Flight::FlightNumber, 20).not_null())
                    .col(date(Flight::FlightDate).not_null())
                    .col(
                        string_len(Flight::FlightStatus, 30)
                            .not_null()
                            .default("Scheduled"),
                    )
                    .col(string_len(Flight::DepartureAirport, 150).not_null())
                    .col(string_len_null(Flight::DepartureIata, 3))
                    .col(string_len_null(Flight::DepartureTerminal, 10))
                    .col(string_len_null(Flight::DepartureGate, 10))
                    .col(time_null(Flight::DepartureTime))
                    .col(string_len(Flight::ArrivalAirport, 150).not_null())
                    .col(string_len_null(Flight::ArrivalIata, 3))
                    .col(string_len_null(Flight::ArrivalTerminal, 10))
                    .col(string_len_null(Flight::ArrivalGate, 10))
                    .col(time_null(Flight::ArrivalTime))
                    .col(string_len_null(Flight::AirlineName, 100))
                    .col(string_len_null(Flight::AirlineIata, 3))
                    .col(integer_null(Flight::AircraftId))
                    .col(big_integer_null(Flight::Price))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flight_aircraft")
                            .from(Flight::Table, Flight::AircraftId)
                            .to(Airplane::Table, Airplane::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flight_date")
                    .table(Flight::Table)
                    .col(Flight::FlightDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flight::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Flight {
    Table,
    Id,
    FlightNumber,
    FlightDate,
    FlightStatus,
    DepartureAirport,
    DepartureIata,
    DepartureTerminal,
    DepartureGate,
    DepartureTime,
    ArrivalAirport,
    ArrivalIata,
    ArrivalTerminal,
    ArrivalGate,
    ArrivalTime,
    AirlineName,
    AirlineIata,
    AircraftId,
    Price,
}
