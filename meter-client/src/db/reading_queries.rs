use sqlx::SqliteExecutor;
use time::PrimitiveDateTime;

use crate::domain::{format_date, format_time, NewReading, Reading, WindowKind};

const READING_COLUMNS: &str = r#"
    id,
    block_id,
    meter_reading,
    vat_percent,
    additional_fee,
    final_payment,
    tariff_rate,
    date,
    time
"#;

/// Append a reading. No dedup: submitting the same values twice stores two rows.
pub async fn insert_reading<'e, E>(exec: E, reading: &NewReading) -> Result<Reading, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO readings
            (block_id, meter_reading, vat_percent, additional_fee, final_payment, tariff_rate, date, time)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {READING_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, Reading>(&sql)
        .bind(&reading.block_id)
        .bind(reading.meter_reading)
        .bind(reading.vat_percent)
        .bind(reading.additional_fee)
        .bind(reading.final_payment)
        .bind(reading.tariff_rate)
        .bind(reading.date_text())
        .bind(reading.time_text())
        .fetch_one(exec)
        .await?;

    Ok(row)
}

/// Meter value of the newest reading for a block, or `0.0` when the block has none.
pub async fn most_recent_reading<'e, E>(exec: E, block_id: &str) -> Result<f64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let value = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT meter_reading
        FROM readings
        WHERE block_id = ?
        ORDER BY date DESC, time DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(block_id)
    .fetch_optional(exec)
    .await?;

    Ok(value.unwrap_or(0.0))
}

/// Meter value of the newest reading for a block strictly before `(date, time)`,
/// compared as text date-then-time. Rows at the reference timestamp or later
/// are never considered. `0.0` when nothing qualifies.
pub async fn previous_reading<'e, E>(
    exec: E,
    block_id: &str,
    date: &str,
    time: &str,
) -> Result<f64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let value = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT meter_reading
        FROM readings
        WHERE block_id = ?
          AND (date < ? OR (date = ? AND time < ?))
        ORDER BY date DESC, time DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(block_id)
    .bind(date)
    .bind(date)
    .bind(time)
    .fetch_optional(exec)
    .await?;

    Ok(value.unwrap_or(0.0))
}

/// Every reading, newest first.
pub async fn all_readings<'e, E>(exec: E) -> Result<Vec<Reading>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings
        ORDER BY date DESC, time DESC, id DESC
        "#
    );

    sqlx::query_as::<_, Reading>(&sql).fetch_all(exec).await
}

/// All readings of one block, newest first.
pub async fn readings_for_block<'e, E>(exec: E, block_id: &str) -> Result<Vec<Reading>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings
        WHERE block_id = ?
        ORDER BY date DESC, time DESC, id DESC
        "#
    );

    sqlx::query_as::<_, Reading>(&sql)
        .bind(block_id)
        .fetch_all(exec)
        .await
}

/// Readings recorded at or after `now - window`, newest first.
///
/// The range predicate runs on the `(date, time)` index; it relies on the text
/// columns being zero-padded, which every write path guarantees. Rows whose
/// text does not parse are dropped with a warning.
pub async fn readings_in_window<'e, E>(
    exec: E,
    window: WindowKind,
    now: PrimitiveDateTime,
) -> Result<Vec<Reading>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let cutoff = now - window.duration();
    let cutoff = cutoff.replace_nanosecond(0).unwrap_or(cutoff);
    let cutoff_date = format_date(cutoff.date());
    let cutoff_time = format_time(cutoff.time());

    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings
        WHERE date > ? OR (date = ? AND time >= ?)
        ORDER BY date DESC, time DESC, id DESC
        "#
    );

    let rows = sqlx::query_as::<_, Reading>(&sql)
        .bind(&cutoff_date)
        .bind(&cutoff_date)
        .bind(&cutoff_time)
        .fetch_all(exec)
        .await?;

    let filtered = rows
        .into_iter()
        .filter(|row| match row.recorded_at() {
            Some(ts) => ts >= cutoff,
            None => {
                tracing::warn!(
                    id = row.id,
                    date = %row.date,
                    time = %row.time,
                    "skipping reading with unparsable timestamp"
                );
                false
            }
        })
        .collect();

    Ok(filtered)
}

/// Remove one reading. Returns whether a row was actually deleted.
pub async fn delete_reading<'e, E>(exec: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM readings WHERE id = ?")
        .bind(id)
        .execute(exec)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use time::macros::datetime;

    fn reading(block: &str, meter: f64, at: PrimitiveDateTime) -> NewReading {
        NewReading {
            block_id: block.to_string(),
            meter_reading: meter,
            vat_percent: 15.0,
            additional_fee: 50.0,
            final_payment: 0.0,
            tariff_rate: 2.0,
            recorded_at: at,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids_and_stores_text_columns() {
        let pool = connect_in_memory().await.unwrap();

        let first = insert_reading(&pool, &reading("355/10", 120.0, datetime!(2024-01-02 03:04:05)))
            .await
            .unwrap();
        let second = insert_reading(&pool, &reading("355/10", 120.0, datetime!(2024-01-02 03:04:05)))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.date, "2024-01-02");
        assert_eq!(first.time, "03:04:05");
        assert_eq!(all_readings(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn same_second_ties_break_on_latest_insert() {
        let pool = connect_in_memory().await.unwrap();
        let at = datetime!(2024-01-02 03:04:05);
        insert_reading(&pool, &reading("355/10", 120.0, at)).await.unwrap();
        insert_reading(&pool, &reading("355/10", 150.0, at)).await.unwrap();

        assert_eq!(most_recent_reading(&pool, "355/10").await.unwrap(), 150.0);

        let all = all_readings(&pool).await.unwrap();
        assert_eq!(all[0].meter_reading, 150.0);
        assert_eq!(all[1].meter_reading, 120.0);

        let by_block = readings_for_block(&pool, "355/10").await.unwrap();
        assert_eq!(by_block[0].meter_reading, 150.0);

        assert_eq!(
            previous_reading(&pool, "355/10", "2024-01-02", "03:04:05")
                .await
                .unwrap(),
            0.0
        );
    }

    #[tokio::test]
    async fn most_recent_reading_is_zero_for_unknown_block() {
        let pool = connect_in_memory().await.unwrap();
        assert_eq!(most_recent_reading(&pool, "355/1").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn most_recent_reading_orders_by_date_then_time() {
        let pool = connect_in_memory().await.unwrap();
        for (meter, at) in [
            (150.0, datetime!(2024-02-01 08:00:00)),
            (120.0, datetime!(2024-01-31 23:59:59)),
            (90.0, datetime!(2024-02-01 07:59:59)),
        ] {
            insert_reading(&pool, &reading("355/10", meter, at)).await.unwrap();
        }
        insert_reading(&pool, &reading("355/11", 999.0, datetime!(2024-03-01 00:00:00)))
            .await
            .unwrap();

        assert_eq!(most_recent_reading(&pool, "355/10").await.unwrap(), 150.0);
    }

    #[tokio::test]
    async fn previous_reading_excludes_reference_timestamp_and_later() {
        let pool = connect_in_memory().await.unwrap();
        for (meter, at) in [
            (100.0, datetime!(2024-01-01 10:00:00)),
            (120.0, datetime!(2024-01-02 10:00:00)),
            (150.0, datetime!(2024-01-02 12:00:00)),
        ] {
            insert_reading(&pool, &reading("355/10", meter, at)).await.unwrap();
        }

        let p = |d: &'static str, t: &'static str| {
            let pool = pool.clone();
            async move { previous_reading(&pool, "355/10", d, t).await.unwrap() }
        };

        assert_eq!(p("2024-01-02", "12:00:00").await, 120.0);
        assert_eq!(p("2024-01-02", "10:00:00").await, 100.0);
        assert_eq!(p("2024-01-02", "10:00:01").await, 120.0);
        assert_eq!(p("2024-01-01", "10:00:00").await, 0.0);
        assert_eq!(p("2025-01-01", "00:00:00").await, 150.0);
    }

    #[tokio::test]
    async fn readings_for_block_is_filtered_and_newest_first() {
        let pool = connect_in_memory().await.unwrap();
        insert_reading(&pool, &reading("355/10", 1.0, datetime!(2024-01-01 00:00:00)))
            .await
            .unwrap();
        insert_reading(&pool, &reading("355/12", 2.0, datetime!(2024-01-02 00:00:00)))
            .await
            .unwrap();
        insert_reading(&pool, &reading("355/10", 3.0, datetime!(2024-01-03 00:00:00)))
            .await
            .unwrap();

        let rows = readings_for_block(&pool, "355/10").await.unwrap();
        let meters: Vec<f64> = rows.iter().map(|r| r.meter_reading).collect();
        assert_eq!(meters, vec![3.0, 1.0]);
    }

    #[tokio::test]
    async fn day_window_excludes_rows_older_than_24_hours() {
        let pool = connect_in_memory().await.unwrap();
        let now = datetime!(2024-06-10 12:00:00);

        insert_reading(&pool, &reading("355/10", 1.0, datetime!(2024-06-09 11:59:59)))
            .await
            .unwrap();
        insert_reading(&pool, &reading("355/10", 2.0, datetime!(2024-06-09 12:00:00)))
            .await
            .unwrap();
        insert_reading(&pool, &reading("355/10", 3.0, datetime!(2024-06-10 11:00:00)))
            .await
            .unwrap();

        let day = readings_in_window(&pool, WindowKind::Day, now).await.unwrap();
        let meters: Vec<f64> = day.iter().map(|r| r.meter_reading).collect();
        assert_eq!(meters, vec![3.0, 2.0]);

        let week = readings_in_window(&pool, WindowKind::Week, now).await.unwrap();
        assert_eq!(week.len(), 3);
    }

    #[tokio::test]
    async fn window_skips_rows_with_malformed_timestamps() {
        let pool = connect_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO readings (block_id, meter_reading, vat_percent, additional_fee, final_payment, tariff_rate, date, time) \
             VALUES ('355/10', 5.0, 0, 0, 0, 0, '2024-06-10', 'noon')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let rows = readings_in_window(&pool, WindowKind::Year, datetime!(2024-06-10 23:00:00))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn delete_is_boolean_and_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        let kept = insert_reading(&pool, &reading("355/10", 1.0, datetime!(2024-01-01 00:00:00)))
            .await
            .unwrap();
        let doomed = insert_reading(&pool, &reading("355/10", 2.0, datetime!(2024-01-02 00:00:00)))
            .await
            .unwrap();

        assert!(!delete_reading(&pool, doomed.id + 100).await.unwrap());
        assert_eq!(all_readings(&pool).await.unwrap().len(), 2);

        assert!(delete_reading(&pool, doomed.id).await.unwrap());
        assert!(!delete_reading(&pool, doomed.id).await.unwrap());

        let remaining = all_readings(&pool).await.unwrap();
        assert_eq!(remaining, vec![kept]);
    }
}
