use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_SCHEDULED: &str = "Scheduled";
pub const STATUS_CANCELLED: &str = "Cancelled";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flight")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub flight_number: String,
    pub flight_date: Date,
    pub flight_status: String,
    pub departure_airport: String,
    pub departure_iata: Option<String>,
    pub departure_terminal: Option<String>,
    pub departure_gate: Option<String>,
    pub departure_time: Option<Time>,
    pub arrival_airport: String,
    pub arrival_iata: Option<String>,
    pub arrival_terminal: Option<String>,
    pub arrival_gate: Option<String>,
    pub arrival_time: Option<Time>,
    pub airline_name: Option<String>,
    pub airline_iata: Option<String>,
    pub aircraft_id: Option<i32>,
    /// Minor currency units.
    pub price: Option<i64>,
}

impl Model {
    pub fn is_cancelled(&self) -> bool {
        self.flight_status.eq_ignore_ascii_case(STATUS_CANCELLED)
    }

    /// Bookable: not cancelled and carries a positive fare.
    pub fn is_bookable(&self) -> bool {
        !self.is_cancelled() && self.price.is_some_and(|p| p > 0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::airplane::Entity",
        from = "Column::AircraftId",
        to = "super::airplane::Column::Id"
    )]
    Aircraft,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::airplane::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Aircraft.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
