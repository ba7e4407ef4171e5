use crate::corrections;
use crate::types::{IncidentRecord, RawRow};
use crate::util::parse_i32_safe;
use csv::ReaderBuilder;
use std::error::Error;
use std::io;

/// Collection year dropped from every analysis; its reporting in the
/// source extract is partial and would skew year-over-year comparisons.
pub const EXCLUDED_YEAR: i32 = 2021;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub excluded_year_rows: usize,
    pub parse_errors: usize,
    pub corrected_labels: usize,
}

pub fn load_and_clean(path: &str) -> Result<(Vec<IncidentRecord>, LoadReport), Box<dyn Error>> {
    // The source extract is semicolon-delimited.
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;
    Ok(clean_records(&mut rdr))
}

/// Cleaning pass over an open CSV reader. Generic over the byte source so
/// tests can feed in-memory data through the same code path as files.
pub fn clean_records<R: io::Read>(rdr: &mut csv::Reader<R>) -> (Vec<IncidentRecord>, LoadReport) {
    let mut report = LoadReport::default();
    let mut records: Vec<IncidentRecord> = Vec::new();

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                log::debug!("row {}: unreadable: {e}", idx + 1);
                report.parse_errors += 1;
                continue;
            }
        };

        let Some(year) = parse_i32_safe(row.year.as_deref()) else {
            log::debug!("row {}: bad year {:?}", idx + 1, row.year);
            report.parse_errors += 1;
            continue;
        };
        if year == EXCLUDED_YEAR {
            report.excluded_year_rows += 1;
            continue;
        }

        let month = match parse_i32_safe(row.month.as_deref()) {
            Some(m) if (1..=12).contains(&m) => m as u32,
            _ => {
                log::debug!("row {}: bad month {:?}", idx + 1, row.month);
                report.parse_errors += 1;
                continue;
            }
        };

        // The text columns are grouping keys downstream; a blank value
        // would surface as a phantom category in every chart, so the row
        // is dropped instead.
        let Some(raw_crime) = non_blank(row.crime_type.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };
        let Some(raw_department) = non_blank(row.department.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };
        let Some(region) = non_blank(row.region.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };

        let (crime_type, crime_corrected) = corrections::normalize_crime(raw_crime);
        let (department, department_corrected) = corrections::normalize_department(raw_department);
        if crime_corrected || department_corrected {
            report.corrected_labels += 1;
        }

        records.push(IncidentRecord {
            year,
            month,
            crime_type,
            department,
            region: region.to_string(),
        });
    }

    report.kept_rows = records.len();
    (records, report)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ANO_BO;MES_ESTATISTICA;NATUREZA_APURADA;NOME_DEPARTAMENTO;regiao\n";

    fn reader(body: &str) -> csv::Reader<&[u8]> {
        ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(body.as_bytes())
    }

    fn clean(body: &str) -> (Vec<IncidentRecord>, LoadReport) {
        let data = format!("{HEADER}{body}");
        clean_records(&mut reader(&data))
    }

    #[test]
    fn keeps_valid_rows_and_normalizes_labels() {
        let (records, report) = clean(
            "2022;1;furto - outros;decap;Sul\n\
             2023;2;homicidio doloso;demacro;Leste\n",
        );
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.corrected_labels, 2);
        assert_eq!(
            records[0],
            IncidentRecord {
                year: 2022,
                month: 1,
                crime_type: "Furto".to_string(),
                department: "Decap".to_string(),
                region: "Sul".to_string(),
            }
        );
        // Unmapped crime label passes through; the department is corrected.
        assert_eq!(records[1].crime_type, "homicidio doloso");
        assert_eq!(records[1].department, "Demacro");
    }

    #[test]
    fn drops_the_partial_collection_year() {
        let (records, report) = clean(
            "2021;5;roubo - outros;decap;Norte\n\
             2022;5;roubo - outros;decap;Norte\n",
        );
        assert_eq!(report.excluded_year_rows, 1);
        assert_eq!(report.kept_rows, 1);
        assert_eq!(records[0].year, 2022);
    }

    #[test]
    fn counts_unparseable_rows_without_keeping_them() {
        let (records, report) = clean(
            "abc;3;furto - outros;decap;Sul\n\
             2023;13;furto - outros;decap;Sul\n\
             2023;0;furto - outros;decap;Sul\n\
             2024;4;  ;decap;Sul\n\
             2024;4;furto - outros;decap;\n\
             2024;4;furto - outros;decap;Sul\n",
        );
        assert_eq!(report.total_rows, 6);
        assert_eq!(report.parse_errors, 5);
        assert_eq!(report.kept_rows, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, 2024);
    }

    #[test]
    fn header_only_input_yields_nothing() {
        let (records, report) = clean("");
        assert!(records.is_empty());
        assert_eq!(report.total_rows, 0);
        assert_eq!(report.kept_rows, 0);
    }

    #[test]
    fn whitespace_around_values_is_tolerated() {
        let (records, report) = clean(" 2022 ; 3 ; trafico de entorpecentes ; decap ; Oeste \n");
        assert_eq!(report.kept_rows, 1);
        assert_eq!(records[0].month, 3);
        assert_eq!(records[0].crime_type, "Trafico de entorpecentes");
        assert_eq!(records[0].region, "Oeste");
    }
}
