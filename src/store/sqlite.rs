//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the `insights` table created by
//! [`crate::migrate`]. Timestamps are stored as Unix milliseconds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::filter::{FilterField, InsightFilter, MatchStrategy};
use crate::models::{Insight, NumericField, StoredInsight};

use super::{Store, StoreError, StoreResult};

const SELECT_COLUMNS: &str = "id, end_year, intensity, sector, topic, insight, url, region, \
     start_year, impact, added, published, country, relevance, pestle, source, title, \
     likelihood, created_at, updated_at";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn millis_to_datetime(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidRecord(format!("timestamp out of range: {}", ms)))
}

fn row_to_insight(row: &SqliteRow) -> StoreResult<StoredInsight> {
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(StoredInsight {
        id: row.try_get("id")?,
        insight: Insight {
            end_year: row.try_get("end_year")?,
            intensity: row.try_get("intensity")?,
            sector: row.try_get("sector")?,
            topic: row.try_get("topic")?,
            insight: row.try_get("insight")?,
            url: row.try_get("url")?,
            region: row.try_get("region")?,
            start_year: row.try_get("start_year")?,
            impact: row.try_get("impact")?,
            added: row.try_get("added")?,
            published: row.try_get("published")?,
            country: row.try_get("country")?,
            relevance: row.try_get("relevance")?,
            pestle: row.try_get("pestle")?,
            source: row.try_get("source")?,
            title: row.try_get("title")?,
            likelihood: row.try_get("likelihood")?,
        },
        created_at: millis_to_datetime(created_at)?,
        updated_at: millis_to_datetime(updated_at)?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn find(&self, filter: &InsightFilter) -> StoreResult<Vec<StoredInsight>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM insights", SELECT_COLUMNS));

        // Exact predicates narrow the scan in SQL. Substring predicates need
        // Unicode case folding, which SQLite's lower() lacks, so they run on
        // the fetched rows.
        let exact = filter
            .predicates()
            .iter()
            .filter(|p| p.strategy == MatchStrategy::Exact);
        for (i, pred) in exact.enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(pred.field.column())
                .push(" = ")
                .push_bind(pred.value.clone());
        }
        qb.push(" ORDER BY id ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut found = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = row_to_insight(row)?;
            if filter.matches(&record.insight) {
                found.push(record);
            }
        }
        Ok(found)
    }

    async fn distinct(&self, field: FilterField) -> StoreResult<Vec<String>> {
        let column = field.column();
        let sql = format!(
            "SELECT DISTINCT {col} FROM insights WHERE {col} IS NOT NULL AND {col} <> ''",
            col = column
        );
        let values: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(values)
    }

    async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM insights")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn average(&self, field: NumericField) -> StoreResult<Option<f64>> {
        let sql = format!(
            "SELECT AVG({col}) FROM insights WHERE {col} IS NOT NULL",
            col = field.column()
        );
        let avg: Option<f64> = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(avg)
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM insights")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_many(&self, records: &[Insight]) -> StoreResult<u64> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        for r in records {
            sqlx::query(
                r#"
                INSERT INTO insights (end_year, intensity, sector, topic, insight, url, region,
                                      start_year, impact, added, published, country, relevance,
                                      pestle, source, title, likelihood, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&r.end_year)
            .bind(r.intensity)
            .bind(&r.sector)
            .bind(&r.topic)
            .bind(&r.insight)
            .bind(&r.url)
            .bind(&r.region)
            .bind(&r.start_year)
            .bind(&r.impact)
            .bind(&r.added)
            .bind(&r.published)
            .bind(&r.country)
            .bind(r.relevance)
            .bind(&r.pestle)
            .bind(&r.source)
            .bind(&r.title)
            .bind(r.likelihood)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::filter::DataParams;
    use crate::{db, migrate};
    use tempfile::TempDir;

    async fn test_store(tmp: &TempDir) -> SqliteStore {
        let cfg = DbConfig {
            url: format!("sqlite:{}", tmp.path().join("insights.sqlite").display()),
            max_connections: 2,
        };
        let pool = db::connect(&cfg).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn insight(sector: &str, country: &str, end_year: &str) -> Insight {
        Insight {
            sector: Some(sector.to_string()),
            country: Some(country.to_string()),
            end_year: Some(end_year.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_in_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;

        let inserted = store
            .insert_many(&[
                insight("Energy", "India", "2020"),
                insight("Retail", "Nigeria", "2025"),
                insight("Energy", "United States of America", "2020"),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let all = store.find(&InsightFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(all[1].insight.country.as_deref(), Some("Nigeria"));
        assert_eq!(all[0].insight.intensity, None);
    }

    #[tokio::test]
    async fn test_find_matches_memory_semantics() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        store
            .insert_many(&[
                insight("Energy", "India", "2020"),
                insight("energy storage", "Indonesia", "2021"),
                insight("Retail", "India", "2020"),
                Insight::default(),
            ])
            .await
            .unwrap();

        let filter = InsightFilter::from_params(&DataParams {
            sector: Some("ENERGY".to_string()),
            country: Some("ind".to_string()),
            ..Default::default()
        });
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| filter.matches(&r.insight)));

        let filter = InsightFilter::from_params(&DataParams {
            end_year: Some("202".to_string()),
            ..Default::default()
        });
        assert!(store.find(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_substring_wildcards_are_literal() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        store
            .insert_many(&[insight("Energy", "India", ""), insight("En_rgy", "India", "")])
            .await
            .unwrap();

        let filter = InsightFilter::from_params(&DataParams {
            sector: Some("en_r".to_string()),
            ..Default::default()
        });
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].insight.sector.as_deref(), Some("En_rgy"));
    }

    #[tokio::test]
    async fn test_contains_folds_non_ascii_case() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        store
            .insert_many(&[
                insight("Énergie", "Côte d'Ivoire", "2030"),
                insight("Energy", "India", "2030"),
                insight("énergie", "Côte d'Ivoire", "2031"),
            ])
            .await
            .unwrap();

        let filter = InsightFilter::from_params(&DataParams {
            country: Some("CÔTE".to_string()),
            sector: Some("ÉNERG".to_string()),
            end_year: Some("2030".to_string()),
            ..Default::default()
        });
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].insight.sector.as_deref(), Some("Énergie"));

        let filter = InsightFilter::from_params(&DataParams {
            sector: Some("énergie".to_string()),
            ..Default::default()
        });
        assert_eq!(store.find(&filter).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_distinct_and_aggregates() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        store
            .insert_many(&[
                Insight {
                    intensity: Some(2.0),
                    topic: Some("oil".to_string()),
                    ..Default::default()
                },
                Insight {
                    intensity: Some(4.0),
                    topic: Some(String::new()),
                    ..Default::default()
                },
                Insight {
                    relevance: Some(10.0),
                    topic: Some("oil".to_string()),
                    ..Default::default()
                },
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(
            store.distinct(FilterField::Topic).await.unwrap(),
            vec!["oil".to_string()]
        );
        assert!(store.distinct(FilterField::Country).await.unwrap().is_empty());
        assert_eq!(
            store.average(NumericField::Intensity).await.unwrap(),
            Some(3.0)
        );
        assert_eq!(
            store.average(NumericField::Relevance).await.unwrap(),
            Some(10.0)
        );
        assert_eq!(store.average(NumericField::Likelihood).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let tmp = TempDir::new().unwrap();
        let store = test_store(&tmp).await;
        store
            .insert_many(&[insight("a", "b", "c"), insight("d", "e", "f")])
            .await
            .unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
        store.close().await;
    }
}
