pub mod reading_queries;
pub mod schema;
pub mod settings_queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use reading_queries::{
    all_readings, delete_reading, insert_reading, most_recent_reading, previous_reading,
    readings_for_block, readings_in_window,
};
pub use schema::ensure_schema;
pub use settings_queries::{load_locale, store_locale};

/// Open (creating if missing) the ledger database and make sure the schema exists.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory pool. The connection is never recycled, so the
/// database lives as long as the pool.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}
