use sqlx::SqliteExecutor;

use crate::domain::Locale;

const LANGUAGE_KEY: &str = "language";

/// Saved display language, English when nothing was saved yet.
pub async fn load_locale<'e, E>(exec: E) -> Result<Locale, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let code = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
        .bind(LANGUAGE_KEY)
        .fetch_optional(exec)
        .await?;

    Ok(code.map(|c| Locale::from_code(&c)).unwrap_or_default())
}

pub async fn store_locale<'e, E>(exec: E, locale: Locale) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(LANGUAGE_KEY)
    .bind(locale.code())
    .execute(exec)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn locale_defaults_to_english_and_persists() {
        let pool = connect_in_memory().await.unwrap();
        assert_eq!(load_locale(&pool).await.unwrap(), Locale::En);

        store_locale(&pool, Locale::Am).await.unwrap();
        assert_eq!(load_locale(&pool).await.unwrap(), Locale::Am);

        store_locale(&pool, Locale::En).await.unwrap();
        assert_eq!(load_locale(&pool).await.unwrap(), Locale::En);
    }
}
