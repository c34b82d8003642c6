pub use sea_orm_migration::prelude::*;

pub mod entity_iden;
mod m20240501_000001_create_users_and_loans;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240501_000001_create_users_and_loans::Migration)]
    }
}
