pub use sea_orm_migration::prelude::*;

mod m20250801_000001_create_reference_data;
mod m20250801_000002_create_users;
mod m20250801_000003_create_admins;
mod m20250801_000004_create_flights;
mod m20250801_000005_create_bookings;
mod m20250801_000006_create_passengers;
mod m20250801_000007_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_reference_data::Migration),
            Box::new(m20250801_000002_create_users::Migration),
            Box::new(m20250801_000003_create_admins::Migration),
            Box::new(m20250801_000004_create_flights::Migration),
            Box::new(m20250801_000005_create_bookings::Migration),
            Box::new(m20250801_000006_create_passengers::Migration),
            Box::new(m20250801_000007_create_payments::Migration),
        ]
    }
}
