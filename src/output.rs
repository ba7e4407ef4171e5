use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Console preview: numbered report header, an optional scope note, then
/// the first `max_rows` rows as a markdown table.
pub fn preview_table<T>(
    report_no: usize,
    title: &str,
    note: Option<&str>,
    rows: &[T],
    max_rows: usize,
) where
    T: Tabled + Clone,
{
    println!("{}", report_header(report_no, title, note));
    println!();
    preview_table_rows(rows, max_rows);
}

/// Header shared by every numbered report in the suite.
pub fn report_header(report_no: usize, title: &str, note: Option<&str>) -> String {
    match note {
        Some(n) => format!("Report {}: {}\n({})", report_no, title, n),
        None => format!("Report {}: {}", report_no, title),
    }
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
