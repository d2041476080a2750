//! # Database
//!
//! The option store and widget settings live in a SeaORM database: SQLite by
//! default, Postgres when `SOCIAL_METADATA_DATABASE_URL` points at one.

use std::time::Duration;

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tokio::time::sleep;

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("database url is empty")]
    EmptyUrl,
    #[error("unsupported database url scheme '{scheme}', expected sqlite or postgres")]
    UnsupportedScheme { scheme: String },
    #[error("database unreachable after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: DbErr,
    },
}

/// Storage engine picked from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self, DatabaseError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "" if url.is_empty() => Err(DatabaseError::EmptyUrl),
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            other => Err(DatabaseError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

/// Every pooled connection to `sqlite::memory:` opens its own empty database.
fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Connection attempts and the delay before the second one; the delay doubles
/// after every failure.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    attempts: u32,
    first_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            first_delay: Duration::from_millis(100),
        }
    }
}

fn connect_options(cfg: &AppConfig) -> ConnectOptions {
    let max_connections = if is_in_memory_sqlite(&cfg.database_url) {
        1
    } else {
        cfg.db_max_connections
    };

    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.max_connections(max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(10 * 60))
        .max_lifetime(Duration::from_secs(30 * 60))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    opt
}

async fn connect_with_retry(
    opt: ConnectOptions,
    policy: RetryPolicy,
) -> Result<DatabaseConnection, DatabaseError> {
    let mut delay = policy.first_delay;
    let mut attempt = 1;
    loop {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!("Connected to database on attempt {attempt}");
                return Ok(conn);
            }
            Err(source) if attempt >= policy.attempts => {
                log::error!("Giving up on database after {attempt} attempts: {source}");
                return Err(DatabaseError::Unreachable {
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                log::warn!("Database connection attempt {attempt} failed ({e}), retrying in {delay:?}");
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Opens the connection pool described by `cfg`.
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    let backend = Backend::from_url(&cfg.database_url)?;
    log::debug!("Opening {backend:?} connection pool");
    Ok(connect_with_retry(connect_options(cfg), RetryPolicy::default()).await?)
}

/// Applies all pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to apply database migrations")?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Round trip to the database, used by the readiness probe.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    db.ping().await.context("Database did not answer ping")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_follows_url_scheme() {
        assert_eq!(Backend::from_url("sqlite://data.db?mode=rwc").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("postgres://u:p@db/social").unwrap(), Backend::Postgres);
        assert!(matches!(Backend::from_url(""), Err(DatabaseError::EmptyUrl)));
        assert!(matches!(
            Backend::from_url("mysql://localhost/db"),
            Err(DatabaseError::UnsupportedScheme { ref scheme }) if scheme == "mysql"
        ));
    }

    #[test]
    fn in_memory_sqlite_is_limited_to_one_connection() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 8,
            ..Default::default()
        };
        assert_eq!(connect_options(&config).get_max_connections(), Some(1));

        let config = AppConfig {
            database_url: "sqlite://data.db?mode=rwc".to_string(),
            db_max_connections: 8,
            ..Default::default()
        };
        assert_eq!(connect_options(&config).get_max_connections(), Some(8));
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_connecting() {
        let config = AppConfig {
            database_url: String::new(),
            ..Default::default()
        };

        let err = init_pool(&config).await.unwrap_err();
        assert!(matches!(err.downcast::<DatabaseError>(), Ok(DatabaseError::EmptyUrl)));
    }

    #[tokio::test]
    async fn in_memory_pool_migrates_and_answers_ping() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            ..Default::default()
        };

        let db = init_pool(&config).await.unwrap();
        migrate(&db).await.unwrap();
        health_check(&db).await.unwrap();
    }
}
