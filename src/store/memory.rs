//! In-memory [`Store`] implementation for tests.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, kept in insertion
//! order. Filtering goes through [`InsightFilter::matches`].

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::filter::{FilterField, InsightFilter};
use crate::models::{Insight, NumericField, StoredInsight};

use super::{Store, StoreError, StoreResult};

struct Inner {
    records: Vec<StoredInsight>,
    next_id: i64,
}

/// In-memory insight collection.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Build a store pre-populated with `records`, in order.
    pub fn with_records(records: impl IntoIterator<Item = Insight>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().unwrap_or_else(|e| e.into_inner());
            for insight in records {
                push_record(&mut inner, insight);
            }
        }
        store
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push_record(inner: &mut Inner, insight: Insight) {
    let now = Utc::now();
    let id = inner.next_id;
    inner.next_id += 1;
    inner.records.push(StoredInsight {
        id,
        insight,
        created_at: now,
        updated_at: now,
    });
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find(&self, filter: &InsightFilter) -> StoreResult<Vec<StoredInsight>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .iter()
            .filter(|r| filter.matches(&r.insight))
            .cloned()
            .collect())
    }

    async fn distinct(&self, field: FilterField) -> StoreResult<Vec<String>> {
        let inner = self.read()?;
        let values: BTreeSet<&str> = inner
            .records
            .iter()
            .filter_map(|r| field.value_of(&r.insight))
            .filter(|v| !v.is_empty())
            .collect();
        Ok(values.into_iter().map(str::to_string).collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.read()?.records.len() as u64)
    }

    async fn average(&self, field: NumericField) -> StoreResult<Option<f64>> {
        let inner = self.read()?;
        let (sum, n) = inner
            .records
            .iter()
            .filter_map(|r| field.value_of(&r.insight))
            .fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
        Ok(if n == 0 { None } else { Some(sum / n as f64) })
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let mut inner = self.write()?;
        let removed = inner.records.len() as u64;
        inner.records.clear();
        Ok(removed)
    }

    async fn insert_many(&self, records: &[Insight]) -> StoreResult<u64> {
        let mut inner = self.write()?;
        for insight in records {
            push_record(&mut inner, insight.clone());
        }
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DataParams;

    fn insight(topic: &str, intensity: Option<f64>) -> Insight {
        Insight {
            topic: Some(topic.to_string()),
            intensity,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        store
            .insert_many(&[insight("oil", None), insight("gas", None)])
            .await
            .unwrap();
        let all = store.find(&InsightFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);
        assert_eq!(all[0].insight.topic.as_deref(), Some("oil"));
    }

    #[tokio::test]
    async fn test_find_applies_filter() {
        let store = InMemoryStore::with_records(vec![insight("oil", None), insight("gas", None)]);
        let filter = InsightFilter::from_params(&DataParams {
            topic: Some("GAS".to_string()),
            ..Default::default()
        });
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].insight.topic.as_deref(), Some("gas"));
    }

    #[tokio::test]
    async fn test_find_folds_non_ascii_case() {
        let store = InMemoryStore::with_records(vec![
            insight("Électricité", None),
            insight("electricity", None),
        ]);
        let filter = InsightFilter::from_params(&DataParams {
            topic: Some("ÉLECTR".to_string()),
            ..Default::default()
        });
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].insight.topic.as_deref(), Some("Électricité"));
    }

    #[tokio::test]
    async fn test_distinct_skips_empty_and_duplicates() {
        let store = InMemoryStore::with_records(vec![
            insight("oil", None),
            insight("", None),
            insight("oil", None),
            Insight::default(),
            insight("gas", None),
        ]);
        let topics = store.distinct(FilterField::Topic).await.unwrap();
        assert_eq!(topics, vec!["gas".to_string(), "oil".to_string()]);
    }

    #[tokio::test]
    async fn test_average_ignores_missing() {
        let store = InMemoryStore::with_records(vec![
            insight("a", Some(2.0)),
            insight("b", Some(4.0)),
            insight("c", None),
        ]);
        assert_eq!(
            store.average(NumericField::Intensity).await.unwrap(),
            Some(3.0)
        );
        assert_eq!(store.average(NumericField::Relevance).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = InMemoryStore::with_records(vec![insight("a", None), insight("b", None)]);
        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }
}
