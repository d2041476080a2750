//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations: the generic
//! option store used for credentials and pages, and the widget settings table.

pub mod option;
pub mod widget;

pub use option::{OptionRepository, OptionStore};
pub use widget::WidgetRepository;

/// Fresh in-memory SQLite database with all migrations applied.
#[cfg(test)]
pub(crate) async fn test_db() -> std::sync::Arc<sea_orm::DatabaseConnection> {
    use migration::{Migrator, MigratorTrait};

    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
    // A single connection keeps every query on the same in-memory database.
    opt.max_connections(1).sqlx_logging(false);

    let db = sea_orm::Database::connect(opt)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    std::sync::Arc::new(db)
}
