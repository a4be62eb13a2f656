//! Declarative filter construction for `GET /api/data`.
//!
//! [`FILTER_TABLE`] maps every filterable request parameter to a
//! [`MatchStrategy`]. [`InsightFilter::from_params`] walks that table and
//! keeps one [`Predicate`] per parameter that is present and non-blank.
//! Store backends translate predicates into their own query language;
//! [`InsightFilter::matches`] is the reference evaluation used by the
//! in-memory store.
//!
//! Case-insensitive matching uses full Unicode lowercasing. SQLite's
//! `lower()` folds ASCII only, so the SQLite backend evaluates
//! [`MatchStrategy::ContainsIgnoreCase`] predicates through
//! [`MatchStrategy::matches`] rather than in SQL.

use serde::Deserialize;

use crate::models::Insight;

/// A categorical insight field that can be filtered on or listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    EndYear,
    Topic,
    Sector,
    Region,
    Pestle,
    Source,
    Country,
}

impl FilterField {
    /// Column / JSON key name. Also the query parameter name.
    pub fn column(self) -> &'static str {
        match self {
            FilterField::EndYear => "end_year",
            FilterField::Topic => "topic",
            FilterField::Sector => "sector",
            FilterField::Region => "region",
            FilterField::Pestle => "pestle",
            FilterField::Source => "source",
            FilterField::Country => "country",
        }
    }

    pub fn value_of(self, insight: &Insight) -> Option<&str> {
        let value = match self {
            FilterField::EndYear => &insight.end_year,
            FilterField::Topic => &insight.topic,
            FilterField::Sector => &insight.sector,
            FilterField::Region => &insight.region,
            FilterField::Pestle => &insight.pestle,
            FilterField::Source => &insight.source,
            FilterField::Country => &insight.country,
        };
        value.as_deref()
    }
}

/// How a predicate compares a record's field against the requested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Byte-for-byte equality.
    Exact,
    /// Literal substring containment, ignoring case (Unicode lowercase).
    ContainsIgnoreCase,
}

impl MatchStrategy {
    pub fn matches(self, candidate: &str, needle: &str) -> bool {
        match self {
            MatchStrategy::Exact => candidate == needle,
            MatchStrategy::ContainsIgnoreCase => candidate
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

/// Parameter → match strategy, in the order predicates are emitted.
pub const FILTER_TABLE: [(FilterField, MatchStrategy); 7] = [
    (FilterField::EndYear, MatchStrategy::Exact),
    (FilterField::Topic, MatchStrategy::ContainsIgnoreCase),
    (FilterField::Sector, MatchStrategy::ContainsIgnoreCase),
    (FilterField::Region, MatchStrategy::ContainsIgnoreCase),
    (FilterField::Pestle, MatchStrategy::ContainsIgnoreCase),
    (FilterField::Source, MatchStrategy::ContainsIgnoreCase),
    (FilterField::Country, MatchStrategy::ContainsIgnoreCase),
];

/// Fields listed by `GET /api/filters`.
pub const OPTION_FIELDS: [FilterField; 6] = [
    FilterField::Topic,
    FilterField::Sector,
    FilterField::Region,
    FilterField::Pestle,
    FilterField::Source,
    FilterField::Country,
];

/// Raw query parameters accepted by `GET /api/data`.
///
/// A value that is blank after trimming is ignored. Otherwise the trimmed
/// value is what gets matched, so `end_year=" 2020"` matches `"2020"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataParams {
    pub end_year: Option<String>,
    pub topic: Option<String>,
    pub sector: Option<String>,
    pub region: Option<String>,
    pub pestle: Option<String>,
    pub source: Option<String>,
    pub country: Option<String>,
    /// Accepted for client compatibility; never applied to the filter.
    pub city: Option<String>,
}

impl DataParams {
    pub fn get(&self, field: FilterField) -> Option<&str> {
        let value = match field {
            FilterField::EndYear => &self.end_year,
            FilterField::Topic => &self.topic,
            FilterField::Sector => &self.sector,
            FilterField::Region => &self.region,
            FilterField::Pestle => &self.pestle,
            FilterField::Source => &self.source,
            FilterField::Country => &self.country,
        };
        value.as_deref()
    }
}

/// One field comparison. `value` is already trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: FilterField,
    pub strategy: MatchStrategy,
    pub value: String,
}

impl Predicate {
    /// A record with the field absent never matches.
    pub fn matches(&self, insight: &Insight) -> bool {
        self.field
            .value_of(insight)
            .is_some_and(|candidate| self.strategy.matches(candidate, &self.value))
    }
}

/// Conjunction of predicates. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightFilter {
    predicates: Vec<Predicate>,
}

impl InsightFilter {
    pub fn from_params(params: &DataParams) -> Self {
        let predicates = FILTER_TABLE
            .iter()
            .filter_map(|&(field, strategy)| {
                let value = params.get(field)?.trim();
                if value.is_empty() {
                    return None;
                }
                Some(Predicate {
                    field,
                    strategy,
                    value: value.to_string(),
                })
            })
            .collect();
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, insight: &Insight) -> bool {
        self.predicates.iter().all(|p| p.matches(insight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DataParams {
        DataParams::default()
    }

    fn record(end_year: &str, sector: &str, country: &str) -> Insight {
        Insight {
            end_year: Some(end_year.to_string()),
            sector: Some(sector.to_string()),
            country: Some(country.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_params_empty_filter() {
        let filter = InsightFilter::from_params(&params());
        assert!(filter.is_empty());
        assert!(filter.matches(&Insight::default()));
    }

    #[test]
    fn test_blank_params_omitted() {
        let p = DataParams {
            topic: Some("   ".to_string()),
            sector: Some(String::new()),
            end_year: Some("\t".to_string()),
            ..params()
        };
        assert!(InsightFilter::from_params(&p).is_empty());
    }

    #[test]
    fn test_city_never_applied() {
        let p = DataParams {
            city: Some("Paris".to_string()),
            ..params()
        };
        assert!(InsightFilter::from_params(&p).is_empty());
    }

    #[test]
    fn test_table_strategies() {
        let p = DataParams {
            end_year: Some("2020".to_string()),
            topic: Some("oil".to_string()),
            sector: Some("energy".to_string()),
            region: Some("asia".to_string()),
            pestle: Some("economic".to_string()),
            source: Some("eia".to_string()),
            country: Some("india".to_string()),
            city: None,
        };
        let filter = InsightFilter::from_params(&p);
        assert_eq!(filter.predicates().len(), 7);
        for pred in filter.predicates() {
            let expected = if pred.field == FilterField::EndYear {
                MatchStrategy::Exact
            } else {
                MatchStrategy::ContainsIgnoreCase
            };
            assert_eq!(pred.strategy, expected, "field {:?}", pred.field);
        }
    }

    #[test]
    fn test_values_trimmed() {
        let p = DataParams {
            sector: Some("  Energy ".to_string()),
            ..params()
        };
        let filter = InsightFilter::from_params(&p);
        assert_eq!(filter.predicates()[0].value, "Energy");

        let p = DataParams {
            end_year: Some(" 2020".to_string()),
            ..params()
        };
        assert!(InsightFilter::from_params(&p).matches(&record("2020", "", "")));
    }

    #[test]
    fn test_end_year_exact() {
        let p = DataParams {
            end_year: Some("202".to_string()),
            ..params()
        };
        let filter = InsightFilter::from_params(&p);
        assert!(!filter.matches(&record("2020", "Energy", "India")));

        let p = DataParams {
            end_year: Some("2020".to_string()),
            ..params()
        };
        assert!(InsightFilter::from_params(&p).matches(&record("2020", "Energy", "India")));
    }

    #[test]
    fn test_contains_ignores_case() {
        let p = DataParams {
            sector: Some("energy".to_string()),
            ..params()
        };
        let filter = InsightFilter::from_params(&p);
        assert!(filter.matches(&record("", "Energy", "")));
        assert!(filter.matches(&record("", "Renewable ENERGY", "")));
        assert!(!filter.matches(&record("", "Retail", "")));
    }

    #[test]
    fn test_contains_folds_non_ascii() {
        let p = DataParams {
            country: Some("CÔTE".to_string()),
            ..params()
        };
        let filter = InsightFilter::from_params(&p);
        assert!(filter.matches(&record("", "", "Côte d'Ivoire")));
        assert!(MatchStrategy::ContainsIgnoreCase.matches("TÜRKIYE", "türk"));
        assert!(!MatchStrategy::Exact.matches("Côte", "CÔTE"));
    }

    #[test]
    fn test_contains_is_literal() {
        assert!(!MatchStrategy::ContainsIgnoreCase.matches("Energy", "E.ergy"));
        assert!(MatchStrategy::ContainsIgnoreCase.matches("100% Energy", "100%"));
    }

    #[test]
    fn test_absent_field_never_matches() {
        let p = DataParams {
            country: Some("a".to_string()),
            ..params()
        };
        let filter = InsightFilter::from_params(&p);
        assert!(!filter.matches(&Insight::default()));
    }

    #[test]
    fn test_and_combination() {
        let p = DataParams {
            sector: Some("energy".to_string()),
            country: Some("india".to_string()),
            ..params()
        };
        let filter = InsightFilter::from_params(&p);
        assert!(filter.matches(&record("", "Energy", "India")));
        assert!(!filter.matches(&record("", "Energy", "Nigeria")));
        assert!(!filter.matches(&record("", "Retail", "India")));
    }

    #[test]
    fn test_option_fields_are_filterable_minus_end_year() {
        for field in OPTION_FIELDS {
            assert_ne!(field, FilterField::EndYear);
            assert!(FILTER_TABLE.iter().any(|(f, _)| *f == field));
        }
    }
}
