use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::error::StoreError;

pub type DbPool = Pool<Postgres>;

/// Opens the Postgres pool shared by the record and report stores.
pub async fn connect(database_url: &str) -> Result<DbPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    tracing::info!("database connection pool established");
    Ok(pool)
}

/// Runs the migrations embedded at compile time.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
