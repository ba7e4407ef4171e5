use crate::aggregate::{
    self, AggregateError, DenominatorPolicy, Field, FrequencySummary, GroupAggregate, KeyValue,
    TopNRanking,
};
use crate::cache::AggregateCache;
use crate::types::{
    FunnelRow, IncidentRecord, MonthlyTrendRow, QuarterMonthRow, RegionalShareRow,
    RegionalYearRow, StatRow, SummaryStats, TopCrimeRow, TopCrimeYearRow, YearlyShareRow,
};
use crate::util::format_number;
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};

/// Months covered by the first-quarter comparison.
pub const FIRST_QUARTER_MONTHS: [u32; 3] = [1, 2, 3];

/// How many crimes each ranking keeps per group.
pub const TOP_CRIMES: usize = 5;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn month_name(month: i64) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1],
        _ => "?",
    }
}

fn key_int(aggregate: &GroupAggregate, index: usize) -> i64 {
    aggregate
        .key
        .get(index)
        .and_then(KeyValue::as_int)
        .unwrap_or_default()
}

fn key_text(aggregate: &GroupAggregate, index: usize) -> String {
    aggregate
        .key
        .get(index)
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn format_share(percentage: Option<f64>) -> String {
    format_number(percentage.unwrap_or_default(), 2)
}

fn distinct_years(data: &[IncidentRecord]) -> Vec<i32> {
    let years: BTreeSet<i32> = data.iter().map(|r| r.year).collect();
    years.into_iter().collect()
}

pub fn yearly_distribution(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<YearlyShareRow>, AggregateError> {
    let aggregates = cache.count_by("all", data, &[Field::Year])?;
    let aggregates = aggregate::with_percentage(aggregates, DenominatorPolicy::GrandTotal)?;
    Ok(aggregates
        .into_iter()
        .map(|agg| YearlyShareRow {
            year: key_int(&agg, 0),
            occurrences: agg.count,
            share_pct: format_share(agg.percentage),
        })
        .collect())
}

pub fn first_quarter_breakdown(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<QuarterMonthRow>, AggregateError> {
    let mut rows = Vec::new();
    for year in distinct_years(data) {
        let subset: Vec<IncidentRecord> = data
            .iter()
            .filter(|r| r.year == year && FIRST_QUARTER_MONTHS.contains(&r.month))
            .cloned()
            .collect();
        if subset.is_empty() {
            continue;
        }
        let scope = format!("q1:{year}");
        let monthly = cache.count_by(&scope, &subset, &[Field::Month])?;
        let by_crime = cache.count_by(&scope, &subset, &[Field::Month, Field::CrimeType])?;
        let rankings = aggregate::top_n_per_group(&by_crime, 0, TOP_CRIMES)?;
        for agg in &monthly {
            let month = key_int(agg, 0);
            let top_crimes = rankings
                .iter()
                .find(|r| r.group == KeyValue::Int(month))
                .map(summarize_ranking)
                .unwrap_or_default();
            rows.push(QuarterMonthRow {
                year: i64::from(year),
                month: month_name(month).to_string(),
                occurrences: agg.count,
                top_crimes,
            });
        }
    }
    Ok(rows)
}

fn summarize_ranking(ranking: &TopNRanking) -> String {
    ranking
        .entries
        .iter()
        .map(|e| format!("{} {} ({}%)", e.key, e.count, format_number(e.percentage, 2)))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn monthly_trend(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<MonthlyTrendRow>, AggregateError> {
    let aggregates = cache.count_by("all", data, &[Field::Year, Field::Month])?;
    Ok(aggregates
        .into_iter()
        .map(|agg| {
            let year = key_int(&agg, 0);
            let month = key_int(&agg, 1);
            MonthlyTrendRow {
                year,
                month,
                period: format!("{year:04}-{month:02}"),
                occurrences: agg.count,
            }
        })
        .collect())
}

pub fn regional_by_year(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<RegionalYearRow>, AggregateError> {
    let aggregates = cache.count_by("all", data, &[Field::Year, Field::Region])?;
    // Each year's regions sum to 100%, matching the per-year donut charts.
    let aggregates = aggregate::with_percentage(aggregates, DenominatorPolicy::PerPartition(0))?;
    Ok(aggregates
        .into_iter()
        .map(|agg| RegionalYearRow {
            year: key_int(&agg, 0),
            region: key_text(&agg, 1),
            occurrences: agg.count,
            share_of_year_pct: format_share(agg.percentage),
        })
        .collect())
}

pub fn regional_distribution(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<RegionalShareRow>, AggregateError> {
    let aggregates = cache.count_by("all", data, &[Field::Region])?;
    let aggregates = aggregate::with_percentage(aggregates, DenominatorPolicy::GrandTotal)?;
    Ok(aggregates
        .into_iter()
        .map(|agg| RegionalShareRow {
            region: key_text(&agg, 0),
            occurrences: agg.count,
            share_pct: format_share(agg.percentage),
        })
        .collect())
}

pub fn crime_funnel(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<FunnelRow>, AggregateError> {
    let aggregates = cache.count_by("all", data, &[Field::CrimeType])?;
    let mut aggregates = aggregate::with_percentage(aggregates, DenominatorPolicy::GrandTotal)?;
    // Stable sort over key-sorted input keeps equal counts alphabetical.
    aggregates.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(aggregates
        .into_iter()
        .enumerate()
        .map(|(idx, agg)| FunnelRow {
            stage: idx + 1,
            crime_type: key_text(&agg, 0),
            occurrences: agg.count,
            share_pct: format_share(agg.percentage),
        })
        .collect())
}

fn region_crime_rankings(
    scope: &str,
    records: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<TopNRanking>, AggregateError> {
    let aggregates = cache.count_by(scope, records, &[Field::Region, Field::CrimeType])?;
    aggregate::top_n_per_group(&aggregates, 0, TOP_CRIMES)
}

pub fn top_crimes_by_region_yearly(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<TopCrimeYearRow>, AggregateError> {
    let mut rows = Vec::new();
    for year in distinct_years(data) {
        let subset: Vec<IncidentRecord> = data.iter().filter(|r| r.year == year).cloned().collect();
        let scope = format!("year={year}");
        for TopNRanking { group, entries } in region_crime_rankings(&scope, &subset, cache)? {
            for entry in entries {
                rows.push(TopCrimeYearRow {
                    year: i64::from(year),
                    region: group.to_string(),
                    crime_type: entry.key.to_string(),
                    occurrences: entry.count,
                    share_of_top_pct: format_number(entry.percentage, 2),
                });
            }
        }
    }
    Ok(rows)
}

pub fn top_crimes_by_region(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
) -> Result<Vec<TopCrimeRow>, AggregateError> {
    let mut rows = Vec::new();
    for TopNRanking { group, entries } in region_crime_rankings("all", data, cache)? {
        for entry in entries {
            rows.push(TopCrimeRow {
                region: group.to_string(),
                crime_type: entry.key.to_string(),
                occurrences: entry.count,
                share_of_top_pct: format_number(entry.percentage, 2),
            });
        }
    }
    Ok(rows)
}

pub fn frequency_profile(
    data: &[IncidentRecord],
    cache: &mut AggregateCache,
    field: Field,
) -> Result<FrequencySummary, AggregateError> {
    cache.summarize("all", data, field)
}

/// Renders a frequency summary as the fixed ten-row Statistic/Value table.
pub fn profile_rows(summary: &FrequencySummary) -> Vec<StatRow> {
    let num = |v: f64| format_number(v, 2);
    let row = |statistic: &str, value: String| StatRow {
        statistic: statistic.to_string(),
        value,
    };
    vec![
        row("count", summary.categories.to_string()),
        row("mean", num(summary.mean)),
        row("std", num(summary.std_dev)),
        row("min", summary.min.to_string()),
        row("25%", num(summary.p25)),
        row("50%", num(summary.median)),
        row("75%", num(summary.p75)),
        row("max", summary.max.to_string()),
        row("variance", num(summary.variance)),
        row("mode", summary.mode.clone()),
    ]
}

pub fn generate_summary(data: &[IncidentRecord], cache: &mut AggregateCache) -> SummaryStats {
    let crime_types: HashSet<&str> = data.iter().map(|r| r.crime_type.as_str()).collect();
    let departments: HashSet<&str> = data.iter().map(|r| r.department.as_str()).collect();
    let regions: HashSet<&str> = data.iter().map(|r| r.region.as_str()).collect();
    // The crime-type profile already summarized this scope; reuse it.
    let top_crime = cache
        .summarize("all", data, Field::CrimeType)
        .ok()
        .map(|summary| summary.mode);
    SummaryStats {
        total_records: data.len(),
        years: distinct_years(data),
        crime_types: crime_types.len(),
        departments: departments.len(),
        regions: regions.len(),
        top_crime,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, month: u32, crime: &str, department: &str, region: &str) -> IncidentRecord {
        IncidentRecord {
            year,
            month,
            crime_type: crime.to_string(),
            department: department.to_string(),
            region: region.to_string(),
        }
    }

    // 8 records: two years, three crimes, two regions.
    fn fixture() -> Vec<IncidentRecord> {
        let mut data = Vec::new();
        for _ in 0..3 {
            data.push(rec(2022, 1, "Furto", "Decap", "Sul"));
        }
        data.push(rec(2022, 2, "Roubo", "Dipol", "Norte"));
        for _ in 0..2 {
            data.push(rec(2023, 1, "Furto", "Decap", "Sul"));
        }
        for _ in 0..2 {
            data.push(rec(2023, 4, "Homicidio", "Demacro", "Norte"));
        }
        data
    }

    #[test]
    fn yearly_distribution_splits_the_period() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = yearly_distribution(&data, &mut cache).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2022);
        assert_eq!(rows[0].occurrences, 4);
        assert_eq!(rows[0].share_pct, "50.00");
        assert_eq!(rows[1].year, 2023);
        assert_eq!(rows[1].share_pct, "50.00");
    }

    #[test]
    fn first_quarter_keeps_only_its_months() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = first_quarter_breakdown(&data, &mut cache).unwrap();
        // April 2023 falls outside the quarter.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].year, 2022);
        assert_eq!(rows[0].month, "January");
        assert_eq!(rows[0].occurrences, 3);
        assert_eq!(rows[0].top_crimes, "Furto 3 (100.00%)");
        assert_eq!(rows[1].month, "February");
        assert_eq!(rows[1].occurrences, 1);
        assert_eq!(rows[2].year, 2023);
        assert_eq!(rows[2].month, "January");
        assert_eq!(rows[2].occurrences, 2);
    }

    #[test]
    fn monthly_trend_renders_sorted_periods() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = monthly_trend(&data, &mut cache).unwrap();
        let periods: Vec<&str> = rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2022-01", "2022-02", "2023-01", "2023-04"]);
        assert_eq!(rows[0].occurrences, 3);
        assert_eq!(rows[3].occurrences, 2);
    }

    #[test]
    fn regional_by_year_shares_sum_within_each_year() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = regional_by_year(&data, &mut cache).unwrap();
        assert_eq!(rows.len(), 4);
        // 2022: Norte 1 of 4, Sul 3 of 4.
        assert_eq!(rows[0].region, "Norte");
        assert_eq!(rows[0].share_of_year_pct, "25.00");
        assert_eq!(rows[1].region, "Sul");
        assert_eq!(rows[1].share_of_year_pct, "75.00");
        // 2023: an even split.
        assert_eq!(rows[2].share_of_year_pct, "50.00");
        assert_eq!(rows[3].share_of_year_pct, "50.00");
    }

    #[test]
    fn regional_distribution_covers_the_whole_period() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = regional_distribution(&data, &mut cache).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region, "Norte");
        assert_eq!(rows[0].occurrences, 3);
        assert_eq!(rows[0].share_pct, "37.50");
        assert_eq!(rows[1].region, "Sul");
        assert_eq!(rows[1].share_pct, "62.50");
    }

    #[test]
    fn crime_funnel_orders_stages_by_volume() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = crime_funnel(&data, &mut cache).unwrap();
        let stages: Vec<(usize, &str)> = rows
            .iter()
            .map(|r| (r.stage, r.crime_type.as_str()))
            .collect();
        assert_eq!(
            stages,
            vec![(1, "Furto"), (2, "Homicidio"), (3, "Roubo")]
        );
        assert_eq!(rows[0].share_pct, "62.50");
        assert_eq!(rows[2].share_pct, "12.50");
    }

    #[test]
    fn top_crimes_by_region_renormalizes_to_the_kept_set() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = top_crimes_by_region(&data, &mut cache).unwrap();
        // Norte holds Homicidio 2 and Roubo 1; Sul holds Furto 5.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].region, "Norte");
        assert_eq!(rows[0].crime_type, "Homicidio");
        assert_eq!(rows[0].share_of_top_pct, "66.67");
        assert_eq!(rows[1].crime_type, "Roubo");
        assert_eq!(rows[1].share_of_top_pct, "33.33");
        assert_eq!(rows[2].region, "Sul");
        assert_eq!(rows[2].share_of_top_pct, "100.00");
    }

    #[test]
    fn top_crimes_by_region_yearly_scopes_per_year() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let rows = top_crimes_by_region_yearly(&data, &mut cache).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows
            .iter()
            .all(|r| r.share_of_top_pct == "100.00"));
        let first = &rows[0];
        assert_eq!(first.year, 2022);
        assert_eq!(first.region, "Norte");
        assert_eq!(first.crime_type, "Roubo");
    }

    #[test]
    fn profile_rows_cover_the_fixed_layout() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let summary = frequency_profile(&data, &mut cache, Field::CrimeType).unwrap();
        let rows = profile_rows(&summary);
        let labels: Vec<&str> = rows.iter().map(|r| r.statistic.as_str()).collect();
        assert_eq!(
            labels,
            vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max", "variance", "mode"]
        );
        assert_eq!(rows[0].value, "3");
        assert_eq!(rows[9].value, "Furto");
    }

    #[test]
    fn summary_counts_distinct_dimensions() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        let summary = generate_summary(&data, &mut cache);
        assert_eq!(summary.total_records, 8);
        assert_eq!(summary.years, vec![2022, 2023]);
        assert_eq!(summary.crime_types, 3);
        assert_eq!(summary.departments, 3);
        assert_eq!(summary.regions, 2);
        assert_eq!(summary.top_crime.as_deref(), Some("Furto"));
    }

    #[test]
    fn summary_reuses_the_memoized_profile() {
        let data = fixture();
        let mut cache = AggregateCache::new();
        frequency_profile(&data, &mut cache, Field::CrimeType).unwrap();
        assert_eq!(cache.misses(), 1);
        let summary = generate_summary(&data, &mut cache);
        assert_eq!(summary.top_crime.as_deref(), Some("Furto"));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn month_names_cover_the_calendar() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "?");
        assert_eq!(month_name(13), "?");
    }
}
