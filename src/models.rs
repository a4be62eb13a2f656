//! Core data model: the insight record.
//!
//! Every field is optional. Seed files are loose about types (years written
//! as numbers, intensities written as `""`), so deserialization accepts those
//! shapes and normalizes them instead of rejecting the whole file.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single dashboard insight as it appears in seed files and API responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub pestle: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<f64>,
}

/// An insight as held by a store, with its store-assigned key and timestamps.
///
/// `id` increases with insertion order, which is also the order `find`
/// returns records in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInsight {
    pub id: i64,
    #[serde(flatten)]
    pub insight: Insight,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The numeric metrics that `/api/stats` averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Intensity,
    Relevance,
    Likelihood,
}

impl NumericField {
    pub fn column(self) -> &'static str {
        match self {
            NumericField::Intensity => "intensity",
            NumericField::Relevance => "relevance",
            NumericField::Likelihood => "likelihood",
        }
    }

    pub fn value_of(self, insight: &Insight) -> Option<f64> {
        match self {
            NumericField::Intensity => insight.intensity,
            NumericField::Relevance => insight.relevance,
            NumericField::Likelihood => insight.likelihood,
        }
    }
}

/// Accepts a string, a number (stringified), or null.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

/// Accepts a number, a numeric string, or null. Blank strings mean "absent".
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(de::Error::custom(format!(
                    "expected a number, found {:?}",
                    s
                ))),
            }
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected a number, found {}",
            other
        ))),
    }
}
