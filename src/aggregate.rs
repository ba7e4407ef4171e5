// The aggregation pipeline: pure batch operations over the in-memory
// incident table. Grouping is backed by ordered maps, so equal inputs
// always produce identical, key-sorted output.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::types::IncidentRecord;
use crate::util::{mean, percentile, sample_variance};

/// The closed record schema. Names parse case-insensitively, and the raw
/// CSV header spellings are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Field {
    #[strum(to_string = "year", serialize = "ano_bo")]
    Year,
    #[strum(to_string = "month", serialize = "mes_estatistica")]
    Month,
    #[strum(to_string = "crime_type", serialize = "natureza_apurada")]
    CrimeType,
    #[strum(to_string = "department", serialize = "nome_departamento")]
    Department,
    #[strum(to_string = "region", serialize = "regiao")]
    Region,
}

impl Field {
    /// Resolves a user-supplied column name against the schema.
    pub fn parse(name: &str) -> Result<Self, AggregateError> {
        Self::from_str(name.trim()).map_err(|_| AggregateError::UnknownKey {
            name: name.trim().to_string(),
        })
    }

    fn value_of(self, record: &IncidentRecord) -> KeyValue {
        match self {
            Self::Year => KeyValue::Int(i64::from(record.year)),
            Self::Month => KeyValue::Int(i64::from(record.month)),
            Self::CrimeType => KeyValue::Text(record.crime_type.clone()),
            Self::Department => KeyValue::Text(record.department.clone()),
            Self::Region => KeyValue::Text(record.region.clone()),
        }
    }
}

/// One atom of a grouping key. Integer keys sort numerically, so months
/// and years order correctly in report tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl KeyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Count (and, once annotated, share) of one distinct key combination.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub key: Vec<KeyValue>,
    pub count: u64,
    /// Set by `with_percentage`; `None` straight out of `count_by`.
    pub percentage: Option<f64>,
}

/// Which denominator `with_percentage` divides by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenominatorPolicy {
    /// The sum of every count in the collection.
    GrandTotal,
    /// The sum of counts sharing the key value at the given position.
    PerPartition(usize),
}

/// The ranked head of one primary-key partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TopNRanking {
    pub group: KeyValue,
    pub entries: Vec<RankedEntry>,
}

/// One ranked secondary key. `percentage` is the entry's share of the
/// kept subset, so the entries of a ranking always sum to 100.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub key: KeyValue,
    pub count: u64,
    pub percentage: f64,
}

/// Descriptive statistics of one column's frequency distribution. The
/// numbers describe the per-category counts, not the raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySummary {
    pub categories: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: u64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: u64,
    pub variance: f64,
    pub mode: String,
    pub min_category: String,
    pub max_category: String,
}

/// Failures the pipeline can raise. Every operation is pure, so none of
/// these are transient; retrying the same call cannot succeed.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("aggregation requested over zero records")]
    EmptyInput,
    #[error("percentage denominator for {scope} sums to zero")]
    ZeroDenominator { scope: String },
    #[error("unknown grouping key: {name}")]
    UnknownKey { name: String },
}

/// Groups records by the given fields and counts each distinct
/// combination. Output is sorted ascending by key. An empty field list
/// collapses everything into one grand-total group with an empty key.
pub fn count_by(
    records: &[IncidentRecord],
    fields: &[Field],
) -> Result<Vec<GroupAggregate>, AggregateError> {
    if records.is_empty() {
        return Err(AggregateError::EmptyInput);
    }
    let mut groups: BTreeMap<Vec<KeyValue>, u64> = BTreeMap::new();
    for record in records {
        let key: Vec<KeyValue> = fields.iter().map(|f| f.value_of(record)).collect();
        *groups.entry(key).or_insert(0) += 1;
    }
    Ok(groups
        .into_iter()
        .map(|(key, count)| GroupAggregate {
            key,
            count,
            percentage: None,
        })
        .collect())
}

/// Annotates each aggregate with `100 * count / denominator` under the
/// given policy. Counts are left untouched, so annotation is repeatable.
pub fn with_percentage(
    mut aggregates: Vec<GroupAggregate>,
    policy: DenominatorPolicy,
) -> Result<Vec<GroupAggregate>, AggregateError> {
    if aggregates.is_empty() {
        return Err(AggregateError::EmptyInput);
    }
    match policy {
        DenominatorPolicy::GrandTotal => {
            let total: u64 = aggregates.iter().map(|a| a.count).sum();
            if total == 0 {
                return Err(AggregateError::ZeroDenominator {
                    scope: "grand total".to_string(),
                });
            }
            for agg in &mut aggregates {
                agg.percentage = Some(agg.count as f64 / total as f64 * 100.0);
            }
        }
        DenominatorPolicy::PerPartition(index) => {
            let mut totals: BTreeMap<KeyValue, u64> = BTreeMap::new();
            for agg in &aggregates {
                let part = partition_key(agg, index)?;
                *totals.entry(part.clone()).or_insert(0) += agg.count;
            }
            for agg in &mut aggregates {
                let part = partition_key(agg, index)?.clone();
                let total = totals.get(&part).copied().unwrap_or(0);
                if total == 0 {
                    return Err(AggregateError::ZeroDenominator {
                        scope: part.to_string(),
                    });
                }
                agg.percentage = Some(agg.count as f64 / total as f64 * 100.0);
            }
        }
    }
    Ok(aggregates)
}

fn partition_key(aggregate: &GroupAggregate, index: usize) -> Result<&KeyValue, AggregateError> {
    aggregate
        .key
        .get(index)
        .ok_or_else(|| AggregateError::UnknownKey {
            name: format!("key position {index}"),
        })
}

/// Ranks secondary keys inside each primary-key partition: descending by
/// count, cut to the first `n`. The sort is stable, so ties keep their
/// input enumeration order, which for `count_by` output means ascending
/// secondary key. Entry percentages are relative to the kept subset's
/// sum, not to the partition total.
pub fn top_n_per_group(
    aggregates: &[GroupAggregate],
    primary_key_index: usize,
    n: usize,
) -> Result<Vec<TopNRanking>, AggregateError> {
    if aggregates.is_empty() {
        return Err(AggregateError::EmptyInput);
    }
    let mut partitions: BTreeMap<KeyValue, Vec<(KeyValue, u64)>> = BTreeMap::new();
    for agg in aggregates {
        if agg.key.len() != 2 {
            return Err(AggregateError::UnknownKey {
                name: format!("ranking key of arity {}", agg.key.len()),
            });
        }
        let primary = partition_key(agg, primary_key_index)?.clone();
        // `partition_key` proved the index is 0 or 1.
        let secondary = agg.key[1 - primary_key_index].clone();
        partitions
            .entry(primary)
            .or_default()
            .push((secondary, agg.count));
    }

    let mut rankings = Vec::with_capacity(partitions.len());
    for (group, mut entries) in partitions {
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        let subset_total: u64 = entries.iter().map(|(_, count)| *count).sum();
        if !entries.is_empty() && subset_total == 0 {
            return Err(AggregateError::ZeroDenominator {
                scope: group.to_string(),
            });
        }
        let entries = entries
            .into_iter()
            .map(|(key, count)| RankedEntry {
                key,
                count,
                percentage: count as f64 / subset_total as f64 * 100.0,
            })
            .collect();
        rankings.push(TopNRanking { group, entries });
    }
    Ok(rankings)
}

/// Profiles the frequency distribution of one column: counts per distinct
/// value, then descriptive statistics over those counts. Ties on the mode
/// and on the min/max categories resolve to the first category in
/// ascending order.
pub fn summarize_frequencies(
    records: &[IncidentRecord],
    field: Field,
) -> Result<FrequencySummary, AggregateError> {
    if records.is_empty() {
        return Err(AggregateError::EmptyInput);
    }
    let mut frequencies: BTreeMap<KeyValue, u64> = BTreeMap::new();
    for record in records {
        *frequencies.entry(field.value_of(record)).or_insert(0) += 1;
    }

    let counts: Vec<f64> = frequencies.values().map(|c| *c as f64).collect();
    let mut min: Option<(u64, &KeyValue)> = None;
    let mut max: Option<(u64, &KeyValue)> = None;
    for (category, count) in &frequencies {
        if min.map_or(true, |(c, _)| *count < c) {
            min = Some((*count, category));
        }
        if max.map_or(true, |(c, _)| *count > c) {
            max = Some((*count, category));
        }
    }
    // Non-empty input guarantees at least one category.
    let (min_count, min_category) = min.ok_or(AggregateError::EmptyInput)?;
    let (max_count, max_category) = max.ok_or(AggregateError::EmptyInput)?;

    let variance = sample_variance(&counts);
    Ok(FrequencySummary {
        categories: frequencies.len(),
        mean: mean(&counts),
        std_dev: variance.sqrt(),
        min: min_count,
        p25: percentile(&counts, 25.0),
        median: percentile(&counts, 50.0),
        p75: percentile(&counts, 75.0),
        max: max_count,
        variance,
        mode: max_category.to_string(),
        min_category: min_category.to_string(),
        max_category: max_category.to_string(),
    })
}
