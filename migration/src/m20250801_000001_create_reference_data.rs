use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Country::Table)
                    .if_not_exists()
                    .col(pk_auto(Country::Id))
                    .col(string_len(Country::Name, 100).not_null())
                    .col(string_len(Country::Iso2, 2).not_null().unique_key())
                    .col(string_len_null(Country::Iso3, 3))
                    .col(string_len_null(Country::PhoneCode, 10))
                    .col(string_len_null(Country::Currency, 3))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(pk_auto(City::Id))
                    .col(string_len(City::Name, 100).not_null())
                    .col(string_len_null(City::State, 100))
                    .col(string_len_null(City::CountryIso2, 2))
                    .col(string_len_null(City::Timezone, 64))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Airport::Table)
                    .if_not_exists()
                    .col(pk_auto(Airport::Id))
                    .col(string_len(Airport::Name, 150).not_null())
                    .col(string_len_null(Airport::IataCode, 3))
                    .col(string_len_null(Airport::IcaoCode, 4))
                    .col(string_len_null(Airport::City, 100))
                    .col(string_len_null(Airport::CountryIso2, 2))
                    .col(string_len_null(Airport::Timezone, 64))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Airline::Table)
                    .if_not_exists()
                    .col(pk_auto(Airline::Id))
                    .col(string_len(Airline::Name, 100).not_null())
                    .col(string_len(Airline::IataCode, 3).not_null().unique_key())
                    .col(string_len_null(Airline::IcaoCode, 4))
                    .col(string_len_null(Airline::Callsign, 50))
                    .col(string_len_null(Airline::CountryIso2, 2))
                    .col(string_len_null(Airline::Status, 20))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Airplane::Table)
                    .if_not_exists()
                    .col(pk_auto(Airplane::Id))
                    .col(string_len(Airplane::Name, 100).not_null())
                    .col(string_len_null(Airplane::Model, 100))
                    .col(string_len_null(Airplane::RegistrationNumber, 20))
                    .col(string_len_null(Airplane::AirlineIata, 3))
                    .col(integer_null(Airplane::Capacity))
                    .to_owned(),
            )
            .await?;

        // Seed lookup data
        let countries = Query::insert()
            .into_table(Country::Table)
            .columns([
                Country::Name,
                Country::Iso2,
                Country::Iso3,
                Country::PhoneCode,
                Country::Currency,
            ])
            .values_panic(["India".into(), "IN".into(), "IND".into(), "+91".into(), "INR".into()])
            .to_owned();
        manager.exec_stmt(countries).await?;

        let cities = Query::insert()
            .into_table(City::Table)
            .columns([City::Name, City::State, City::CountryIso2, City::Timezone])
            .values_panic(["Delhi".into(), "Delhi".into(), "IN".into(), "Asia/Kolkata".into()])
            .values_panic(["Mumbai".into(), "Maharashtra".into(), "IN".into(), "Asia/Kolkata".into()])
            .values_panic(["Pune".into(), "Maharashtra".into(), "IN".into(), "Asia/Kolkata".into()])
            .values_panic(["Ahmedabad".into(), "Gujarat".into(), "IN".into(), "Asia/Kolkata".into()])
            .to_owned();
        manager.exec_stmt(cities).await?;

        let airports = Query::insert()
            .into_table(Airport::Table)
            .columns([
                Airport::Name,
                Airport::IataCode,
                Airport::IcaoCode,
                Airport::City,
                Airport::CountryIso2,
                Airport::Timezone,
            ])
            .values_panic([
                "Indira Gandhi International Airport".into(),
                "DEL".into(),
                "VIDP".into(),
                "Delhi".into(),
                "IN".into(),
                "Asia/Kolkata".into(),
            ])
            .values_panic([
                "Chhatrapati Shivaji Maharaj International Airport".into(),
                "BOM".into(),
                "VABB".into(),
                "Mumbai".into(),
                "IN".into(),
                "Asia/Kolkata".into(),
            ])
            .values_panic([
                "Pune Airport".into(),
                "PNQ".into(),
                "VAPO".into(),
                "Pune".into(),
                "IN".into(),
                "Asia/Kolkata".into(),
            ])
            .values_panic([
                "Ahmedabad Airport".into(),
                "AMD".into(),
                "VAAH".into(),
                "Ahmedabad".into(),
                "IN".into(),
                "Asia/Kolkata".into(),
            ])
            .to_owned();
        manager.exec_stmt(airports).await?;

        let airlines = Query::insert()
            .into_table(Airline::Table)
            .columns([
                Airline::Name,
                Airline::IataCode,
                Airline::IcaoCode,
                Airline::Callsign,
                Airline::CountryIso2,
                Airline::Status,
            ])
            .values_panic(["IndiGo".into(), "6E".into(), "IGO".into(), "IFLY".into(), "IN".into(), "active".into()])
            .values_panic(["Air India".into(), "AI".into(), "AIC".into(), "AIRINDIA".into(), "IN".into(), "active".into()])
            .values_panic(["SpiceJet".into(), "SG".into(), "SEJ".into(), "SPICEJET".into(), "IN".into(), "active".into()])
            .to_owned();
        manager.exec_stmt(airlines).await?;

        let airplanes = Query::insert()
            .into_table(Airplane::Table)
            .columns([
                Airplane::Name,
                Airplane::Model,
                Airplane::RegistrationNumber,
                Airplane::AirlineIata,
                Airplane::Capacity,
            ])
            .values_panic(["Airbus A320neo".into(), "A320-251N".into(), "VT-IJA".into(), "6E".into(), 186.into()])
            .values_panic(["Boeing 737".into(), "737-8".into(), "VT-MXA".into(), "SG".into(), 189.into()])
            .to_owned();
        manager.exec_stmt(airplanes).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Airplane::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Airline::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Airport::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(City::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Country::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Country {
    Table,
    Id,
    Name,
    Iso2,
    Iso3,
    PhoneCode,
    Currency,
}

#[derive(DeriveIden)]
pub enum City {
    Table,
    Id,
    Name,
    State,
    CountryIso2,
    Timezone,
}

#[derive(DeriveIden)]
pub enum Airport {
    Table,
    Id,
    Name,
    IataCode,
    IcaoCode,
    City,
    CountryIso2,
    Timezone,
}

#[derive(DeriveIden)]
pub enum Airline {
    Table,
    Id,
    Name,
    IataCode,
    IcaoCode,
    Callsign,
    CountryIso2,
    Status,
}

#[derive(DeriveIden)]
pub enum Airplane {
    Table,
    Id,
    Name,
    Model,
    RegistrationNumber,
    AirlineIata,
    Capacity,
}
