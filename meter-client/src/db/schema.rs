use sqlx::SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS readings (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    block_id       TEXT NOT NULL,
    meter_reading  REAL NOT NULL,
    vat_percent    REAL NOT NULL,
    additional_fee REAL NOT NULL,
    final_payment  REAL NOT NULL,
    tariff_rate    REAL NOT NULL,
    date           TEXT NOT NULL,
    time           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_readings_block_recorded ON readings(block_id, date, time);
CREATE INDEX IF NOT EXISTS idx_readings_recorded ON readings(date, time);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::debug!("ledger schema ensured");
    Ok(())
}
