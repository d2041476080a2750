//! Database migrations for the social metadata service.
//!
//! Two tables back the host-platform collaborators: `options` is the generic
//! key-value store for credentials and authorized pages, `widgets` holds the
//! saved sidebar widget instances.

pub use sea_orm_migration::prelude::*;

mod m2026_10_18_000001_create_options;
mod m2026_10_18_000002_create_widgets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_18_000001_create_options::Migration),
            Box::new(m2026_10_18_000002_create_widgets::Migration),
        ]
    }
}
