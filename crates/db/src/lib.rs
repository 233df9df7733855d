//! Persistence layer: connection pool, migrations, row models, repositories,
//! and the store capability traits consumed by the API and the worker.

pub mod models;
pub mod repositories;
pub mod store;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

pub use store::{JobStore, MemoryStore, PgStore, StoreError, UserStore};

pub type DbPool = sqlx::PgPool;

/// Resolve connection options from the environment.
///
/// `DATABASE_URL` wins when set. Otherwise the discrete libpq variables
/// (`PGHOST`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`, ...) are used, with TLS
/// disabled unless `PGSSLMODE` says otherwise.
pub fn connect_options_from_env() -> Result<PgConnectOptions, sqlx::Error> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return url.parse();
    }

    let options = PgConnectOptions::new();
    if std::env::var("PGSSLMODE").is_err() {
        return Ok(options.ssl_mode(PgSslMode::Disable));
    }
    Ok(options)
}

/// Create a connection pool from resolved connection options.
pub async fn create_pool(options: PgConnectOptions) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect_with(options)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
