use sea_orm_migration::prelude::*;

mod m20250410_000001_create_users;
mod m20250410_000002_create_products;
mod m20250410_000003_create_cart;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250410_000001_create_users::Migration),
            Box::new(m20250410_000002_create_products::Migration),
            Box::new(m20250410_000003_create_cart::Migration),
        ]
    }
}
