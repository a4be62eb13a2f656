use anyhow::Result;
use sqlx::SqlitePool;

/// Columns that get a lookup index, matching the filterable fields.
const INDEXED_COLUMNS: [&str; 7] = [
    "end_year", "topic", "sector", "region", "country", "pestle", "source",
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS insights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            end_year TEXT,
            intensity REAL,
            sector TEXT,
            topic TEXT,
            insight TEXT,
            url TEXT,
            region TEXT,
            start_year TEXT,
            impact TEXT,
            added TEXT,
            published TEXT,
            country TEXT,
            relevance REAL,
            pestle TEXT,
            source TEXT,
            title TEXT,
            likelihood REAL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for column in INDEXED_COLUMNS {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_insights_{col} ON insights({col})",
            col = column
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}
