pub use sea_orm_migration::prelude::*;

mod m20250901_000000_init;
mod m20250915_000000_account_opening_balance;
mod m20251001_000000_password_reset;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000000_init::Migration),
            Box::new(m20250915_000000_account_opening_balance::Migration),
            Box::new(m20251001_000000_password_reset::Migration),
        ]
    }
}
