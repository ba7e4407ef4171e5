use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "ANO_BO")]
    pub year: Option<String>,
    #[serde(rename = "MES_ESTATISTICA")]
    pub month: Option<String>,
    #[serde(rename = "NATUREZA_APURADA")]
    pub crime_type: Option<String>,
    #[serde(rename = "NOME_DEPARTAMENTO")]
    pub department: Option<String>,
    #[serde(rename = "regiao")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRecord {
    pub year: i32,
    pub month: u32,
    pub crime_type: String,
    pub department: String,
    pub region: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearlyShareRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct QuarterMonthRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "TopCrimes")]
    #[tabled(rename = "TopCrimes")]
    pub top_crimes: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyTrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: i64,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionalYearRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "ShareOfYearPct")]
    #[tabled(rename = "ShareOfYearPct")]
    pub share_of_year_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionalShareRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FunnelRow {
    #[serde(rename = "Stage")]
    #[tabled(rename = "Stage")]
    pub stage: usize,
    #[serde(rename = "CrimeType")]
    #[tabled(rename = "CrimeType")]
    pub crime_type: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "SharePct")]
    #[tabled(rename = "SharePct")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TopCrimeYearRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "CrimeType")]
    #[tabled(rename = "CrimeType")]
    pub crime_type: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "ShareOfTopPct")]
    #[tabled(rename = "ShareOfTopPct")]
    pub share_of_top_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TopCrimeRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "CrimeType")]
    #[tabled(rename = "CrimeType")]
    pub crime_type: String,
    #[serde(rename = "Occurrences")]
    #[tabled(rename = "Occurrences")]
    pub occurrences: u64,
    #[serde(rename = "ShareOfTopPct")]
    #[tabled(rename = "ShareOfTopPct")]
    pub share_of_top_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StatRow {
    #[serde(rename = "Statistic")]
    #[tabled(rename = "Statistic")]
    pub statistic: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_records: usize,
    pub years: Vec<i32>,
    pub crime_types: usize,
    pub departments: usize,
    pub regions: usize,
    pub top_crime: Option<String>,
    pub generated_at: DateTime<Utc>,
}
