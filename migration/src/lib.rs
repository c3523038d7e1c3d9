pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_products;
mod m20261001_000002_create_orders;
mod m20261001_000003_create_print_jobs;
mod m20261001_000004_create_settings;
mod m20261001_000005_create_product_options;
mod m20261001_000006_create_feedback;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_products::Migration),
            Box::new(m20261001_000002_create_orders::Migration),
            Box::new(m20261001_000003_create_print_jobs::Migration),
            Box::new(m20261001_000004_create_settings::Migration),
            Box::new(m20261001_000005_create_product_options::Migration),
            Box::new(m20261001_000006_create_feedback::Migration),
        ]
    }
}
