pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_profiles_and_events;
mod m20260301_000002_create_wallet_tables;
mod m20260301_000003_create_event_boosts_table;
mod m20260301_000004_create_premium_tables;
mod m20260301_000005_create_support_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_profiles_and_events::Migration),
            Box::new(m20260301_000002_create_wallet_tables::Migration),
            Box::new(m20260301_000003_create_event_boosts_table::Migration),
            Box::new(m20260301_000004_create_premium_tables::Migration),
            Box::new(m20260301_000005_create_support_tables::Migration),
        ]
    }
}
