// Memoization for repeated report runs. The pipeline functions stay pure;
// this cache sits outside them, keyed by operation, record scope, and
// parameters. A scope label must uniquely name the record subset it was
// computed over. That holds here because the dataset is immutable once
// loaded and the whole cache is replaced on every (re)load.
use std::collections::HashMap;

use crate::aggregate::{self, AggregateError, Field, FrequencySummary, GroupAggregate};
use crate::types::IncidentRecord;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    op: &'static str,
    scope: String,
    params: String,
}

#[derive(Debug, Default)]
pub struct AggregateCache {
    counts: HashMap<CacheKey, Vec<GroupAggregate>>,
    summaries: HashMap<CacheKey, FrequencySummary>,
    hits: usize,
    misses: usize,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `aggregate::count_by` with memoization. Errors are never cached.
    pub fn count_by(
        &mut self,
        scope: &str,
        records: &[IncidentRecord],
        fields: &[Field],
    ) -> Result<Vec<GroupAggregate>, AggregateError> {
        let key = CacheKey {
            op: "count_by",
            scope: scope.to_string(),
            params: join_fields(fields),
        };
        if let Some(cached) = self.counts.get(&key) {
            self.hits += 1;
            log::debug!("cache hit: count_by scope={scope} fields={}", key.params);
            return Ok(cached.clone());
        }
        let result = aggregate::count_by(records, fields)?;
        self.misses += 1;
        self.counts.insert(key, result.clone());
        Ok(result)
    }

    /// `aggregate::summarize_frequencies` with memoization.
    pub fn summarize(
        &mut self,
        scope: &str,
        records: &[IncidentRecord],
        field: Field,
    ) -> Result<FrequencySummary, AggregateError> {
        let key = CacheKey {
            op: "summarize_frequencies",
            scope: scope.to_string(),
            params: field.to_string(),
        };
        if let Some(cached) = self.summaries.get(&key) {
            self.hits += 1;
            log::debug!("cache hit: summarize scope={scope} field={}", key.params);
            return Ok(cached.clone());
        }
        let result = aggregate::summarize_frequencies(records, field)?;
        self.misses += 1;
        self.summaries.insert(key, result.clone());
        Ok(result)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
