//! Query & aggregation operations behind the `/api` endpoints.
//!
//! Each operation takes a store handle, issues its reads (concurrently where
//! they are independent) and returns the payload that the HTTP layer wraps
//! in the `{ success: true, ... }` envelope. Errors are returned as-is; the
//! HTTP layer decides how to report them.

use serde::Serialize;

use crate::filter::{DataParams, FilterField, InsightFilter};
use crate::models::{NumericField, StoredInsight};
use crate::store::{Store, StoreResult};

/// Payload for `GET /api/data`.
#[derive(Debug, Clone, Serialize)]
pub struct DataPayload {
    pub count: usize,
    pub data: Vec<StoredInsight>,
}

/// Distinct values for each filterable field, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub topics: Vec<String>,
    pub sectors: Vec<String>,
    pub regions: Vec<String>,
    pub pestles: Vec<String>,
    pub sources: Vec<String>,
    pub countries: Vec<String>,
}

/// Payload for `GET /api/filters`.
#[derive(Debug, Clone, Serialize)]
pub struct FiltersPayload {
    pub filters: FilterOptions,
}

/// Dashboard headline numbers. Averages are `0` when no record contributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_insights: u64,
    pub avg_intensity: f64,
    pub avg_relevance: f64,
    pub avg_likelihood: f64,
}

/// Payload for `GET /api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsPayload {
    pub stats: DashboardStats,
}

/// All records matching `params`, in insertion order.
pub async fn list_insights(store: &dyn Store, params: &DataParams) -> StoreResult<DataPayload> {
    if let Some(city) = params.city.as_deref() {
        tracing::debug!(city, "ignoring unsupported 'city' parameter");
    }

    let filter = InsightFilter::from_params(params);
    tracing::debug!(predicates = ?filter.predicates(), "listing insights");

    let data = store.find(&filter).await?;
    Ok(DataPayload {
        count: data.len(),
        data,
    })
}

pub async fn filter_options(store: &dyn Store) -> StoreResult<FilterOptions> {
    let (topics, sectors, regions, pestles, sources, countries) = tokio::try_join!(
        store.distinct(FilterField::Topic),
        store.distinct(FilterField::Sector),
        store.distinct(FilterField::Region),
        store.distinct(FilterField::Pestle),
        store.distinct(FilterField::Source),
        store.distinct(FilterField::Country),
    )?;

    Ok(FilterOptions {
        topics: sorted_unique(topics),
        sectors: sorted_unique(sectors),
        regions: sorted_unique(regions),
        pestles: sorted_unique(pestles),
        sources: sorted_unique(sources),
        countries: sorted_unique(countries),
    })
}

pub async fn dashboard_stats(store: &dyn Store) -> StoreResult<DashboardStats> {
    let (total_insights, intensity, relevance, likelihood) = tokio::try_join!(
        store.count(),
        store.average(NumericField::Intensity),
        store.average(NumericField::Relevance),
        store.average(NumericField::Likelihood),
    )?;

    Ok(DashboardStats {
        total_insights,
        avg_intensity: intensity.unwrap_or(0.0),
        avg_relevance: relevance.unwrap_or(0.0),
        avg_likelihood: likelihood.unwrap_or(0.0),
    })
}

/// Drop empties, sort, dedup. Backends already filter empties; this keeps
/// the response contract independent of the backend.
fn sorted_unique(mut values: Vec<String>) -> Vec<String> {
    values.retain(|v| !v.is_empty());
    values.sort();
    values.dedup();
    values
}
