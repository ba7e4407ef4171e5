// Entry point and high-level CLI flow.
//
// - Option [1] loads and cleans the incident CSV, printing diagnostics.
// - Option [2] generates the dashboard report suite: console previews,
//   one CSV per report, and a JSON summary.
// - Option [3] profiles the frequency distribution of a single column.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod aggregate;
mod cache;
mod corrections;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use aggregate::{AggregateError, Field, FrequencySummary};
use cache::AggregateCache;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use strum::IntoEnumIterator;
use types::IncidentRecord;

const DEFAULT_DATA_PATH: &str = "DadosCriminais.csv";

// Simple in-memory app state so the CSV is loaded/cleaned once while
// reports can run any number of times in a single session. Reloading
// replaces the memo cache along with the data.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        cache: AggregateCache::new(),
    })
});

struct AppState {
    data: Option<Vec<IncidentRecord>>,
    cache: AggregateCache,
}

impl AppState {
    /// Swap in a freshly loaded dataset. Memoized aggregates describe the
    /// records they were computed over, so the cache goes with them.
    fn install(&mut self, records: Vec<IncidentRecord>) {
        self.data = Some(records);
        self.cache = AggregateCache::new();
    }
}

/// Read a single line of input after printing the given prompt.
///
/// Reused for the menu choice, the CSV path, and the column name.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Report Selection (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and clean the incident CSV.
///
/// On success, the cleaned records land in `APP_STATE` together with a
/// fresh cache, and a short textual summary of the cleaning is printed.
fn handle_load() {
    let entered = prompt(&format!("CSV path [{}]: ", DEFAULT_DATA_PATH));
    let path = if entered.is_empty() {
        DEFAULT_DATA_PATH.to_string()
    } else {
        entered
    };
    match loader::load_and_clean(&path) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} rows loaded, {} kept after cleaning)",
                util::format_int(load_report.total_rows as i64),
                util::format_int(load_report.kept_rows as i64)
            );
            println!(
                "Note: {} rows from {} dropped (partial collection year); {} rows skipped due to parse/validation errors.",
                util::format_int(load_report.excluded_year_rows as i64),
                loader::EXCLUDED_YEAR,
                util::format_int(load_report.parse_errors as i64)
            );
            if load_report.corrected_labels > 0 {
                println!(
                    "Info: Normalized labels on {} rows.",
                    util::format_int(load_report.corrected_labels as i64)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.install(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: generate the full report suite and the JSON summary.
///
/// This function is intentionally side-effectful:
/// - writes one CSV per report plus two frequency profiles,
/// - writes a JSON summary,
/// - and prints Markdown previews with a narrative line under each.
fn handle_generate_reports() -> Result<(), AggregateError> {
    let mut state = APP_STATE.lock().unwrap();
    let AppState { data, cache } = &mut *state;
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return Ok(());
    };
    if data.is_empty() {
        println!("Error: The loaded dataset has no usable rows; nothing to report.\n");
        return Ok(());
    }

    println!("Generating reports...");
    println!("Outputs saved to individual files...\n");

    let r1 = reports::yearly_distribution(data, cache)?;
    let file1 = "report1_yearly_distribution.csv";
    if let Err(e) = output::write_csv(file1, &r1) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(1, "Occurrences by Year", Some("share of the full period"), &r1, 5);
    println!("How incidents distribute across the years covered by the extract.");
    println!("(Full table exported to {})\n", file1);

    let r2 = reports::first_quarter_breakdown(data, cache)?;
    let file2 = "report2_first_quarter.csv";
    if let Err(e) = output::write_csv(file2, &r2) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(
        2,
        "First-Quarter Occurrences by Month and Year",
        Some("January to March; each month lists its five most frequent crimes"),
        &r2,
        9,
    );
    println!("Compares first-quarter volume across years, with the leading crimes per month.");
    println!("(Full table exported to {})\n", file2);

    let r3 = reports::monthly_trend(data, cache)?;
    let file3 = "report3_monthly_trend.csv";
    if let Err(e) = output::write_csv(file3, &r3) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(3, "Occurrences by Month and Year", None, &r3, 12);
    println!("Monthly counts per year, for spotting seasonal swings and annual shifts.");
    println!("(Full table exported to {})\n", file3);

    let r4 = reports::regional_by_year(data, cache)?;
    let file4 = "report4_regional_by_year.csv";
    if let Err(e) = output::write_csv(file4, &r4) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(
        4,
        "Regional Shares Within Each Year",
        Some("each year's regions sum to 100%"),
        &r4,
        10,
    );
    println!("Which zones concentrate the incidents, year over year.");
    println!("(Full table exported to {})\n", file4);

    let r5 = reports::regional_distribution(data, cache)?;
    let file5 = "report5_regional_distribution.csv";
    if let Err(e) = output::write_csv(file5, &r5) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(5, "Regional Distribution, Full Period", None, &r5, 10);
    println!("Overall share of incidents per zone across the whole period.");
    println!("(Full table exported to {})\n", file5);

    let r6 = reports::crime_funnel(data, cache)?;
    let file6 = "report6_crime_funnel.csv";
    if let Err(e) = output::write_csv(file6, &r6) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(6, "Crime-Type Funnel", Some("stages ordered by overall volume"), &r6, 8);
    println!("Crime types ordered by how often they occur.");
    println!("(Full table exported to {})\n", file6);

    let r7 = reports::top_crimes_by_region_yearly(data, cache)?;
    let file7 = "report7_top_crimes_by_region_year.csv";
    if let Err(e) = output::write_csv(file7, &r7) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(
        7,
        "Top Crimes by Region and Year",
        Some("top 5 per region; shares relative to those 5"),
        &r7,
        10,
    );
    println!("The leading crimes inside each zone, split by year.");
    println!("(Full table exported to {})\n", file7);

    let r8 = reports::top_crimes_by_region(data, cache)?;
    let file8 = "report8_top_crimes_by_region.csv";
    if let Err(e) = output::write_csv(file8, &r8) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(
        8,
        "Top Crimes by Region, Full Period",
        Some("top 5 per region; shares relative to those 5"),
        &r8,
        10,
    );
    println!("The leading crimes inside each zone across the whole period.");
    println!("(Full table exported to {})\n", file8);

    for (report_no, field, title, file) in [
        (
            9,
            Field::CrimeType,
            "Crime-Type Frequency Profile",
            "report9_crime_type_profile.csv",
        ),
        (
            10,
            Field::Department,
            "Department Frequency Profile",
            "report10_department_profile.csv",
        ),
    ] {
        let summary = reports::frequency_profile(data, cache, field)?;
        let rows = reports::profile_rows(&summary);
        if let Err(e) = output::write_csv(file, &rows) {
            eprintln!("Write error: {}", e);
        }
        output::preview_table(
            report_no,
            title,
            Some("statistics over per-category counts"),
            &rows,
            rows.len(),
        );
        print_extremes(&summary);
        println!("Dispersion of incident volume across {} categories.", field);
        println!("(Full table exported to {})\n", file);
    }

    let summary = reports::generate_summary(data, cache);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_records\": {}, \"crime_types\": {}, \"regions\": {}}}\n",
        summary.total_records, summary.crime_types, summary.regions
    );
    log::debug!(
        "cache after report run: {} hits, {} misses",
        cache.hits(),
        cache.misses()
    );
    Ok(())
}

/// Handle option [3]: frequency profile of one user-chosen column.
fn handle_profile() {
    let mut state = APP_STATE.lock().unwrap();
    let AppState { data, cache } = &mut *state;
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    if data.is_empty() {
        println!("Error: The loaded dataset has no usable rows; nothing to profile.\n");
        return;
    }
    let columns = Field::iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let name = prompt(&format!("Column ({}): ", columns));
    let field = match Field::parse(&name) {
        Ok(f) => f,
        Err(e) => {
            println!("Error: {}.\n", e);
            return;
        }
    };
    match reports::frequency_profile(data, cache, field) {
        Ok(summary) => {
            println!();
            render_profile(field, &summary);
            println!();
        }
        Err(e) => println!("Error: {}.\n", e),
    }
}

/// Print the ten-row profile table plus the min/max category line.
fn render_profile(field: Field, summary: &FrequencySummary) {
    let rows = reports::profile_rows(summary);
    println!("Frequency profile: {}", field);
    output::preview_table_rows(&rows, rows.len());
    print_extremes(summary);
}

fn print_extremes(summary: &FrequencySummary) {
    println!(
        "Least frequent: {} ({}); most frequent: {} ({}).",
        summary.min_category,
        util::format_int(summary.min as i64),
        summary.max_category,
        util::format_int(summary.max as i64)
    );
}

fn main() {
    pretty_env_logger::init();
    loop {
        println!("Select an option:");
        println!("[1] Load the data file");
        println!("[2] Generate dashboard reports");
        println!("[3] Column frequency profile\n");
        match prompt("Enter choice: ").as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports() {
                    eprintln!("Report generation failed: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                handle_profile();
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::KeyValue;

    fn rec(year: i32, crime: &str) -> IncidentRecord {
        IncidentRecord {
            year,
            month: 1,
            crime_type: crime.to_string(),
            department: "Decap".to_string(),
            region: "Sul".to_string(),
        }
    }

    #[test]
    fn installing_a_dataset_replaces_the_cache() {
        let mut state = AppState {
            data: None,
            cache: AggregateCache::new(),
        };
        state.install(vec![rec(2022, "Furto"), rec(2022, "Roubo")]);
        let rows = state.data.clone().unwrap();
        let by_year = state.cache.count_by("all", &rows, &[Field::Year]).unwrap();
        assert_eq!(by_year[0].count, 2);
        assert_eq!(state.cache.misses(), 1);

        // Same operation, scope, and params after a reload must recompute
        // over the new records instead of serving the old entry.
        state.install(vec![rec(2023, "Furto")]);
        let rows = state.data.clone().unwrap();
        let by_year = state.cache.count_by("all", &rows, &[Field::Year]).unwrap();
        assert_eq!(by_year.len(), 1);
        assert_eq!(by_year[0].key, vec![KeyValue::Int(2023)]);
        assert_eq!(by_year[0].count, 1);
        assert_eq!(state.cache.hits(), 0);
        assert_eq!(state.cache.misses(), 1);
    }
}
