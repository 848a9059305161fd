//! CSV ingest.
//!
//! Two table shapes are read:
//!
//! - design matrices: optional `start`, `meter_value`, any number of
//!   `hdd_<bp>` / `cdd_<bp>` columns, optional `n_days`, optional weights
//! - data-quality tables for sufficiency checks: `start`, `meter_value`,
//!   `temperature_null`, `temperature_not_null`
//!
//! Empty cells are missing values (`NaN`). Unparseable cells are errors with
//! exit code 2; rows are never skipped because a skipped row would shift the
//! day counts of its neighbours.
//!
//! This is the only place the `hdd_<bp>` / `cdd_<bp>` naming convention is
//! interpreted.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use csv::StringRecord;

use crate::domain::{DegreeDayKind, DesignMatrix, PeriodIndex};
use crate::error::AppError;
use crate::sufficiency::DataQuality;

/// Open `path` and read a design matrix from it.
pub fn load_design_matrix(path: &Path, weights_col: Option<&str>) -> Result<DesignMatrix, AppError> {
    read_design_matrix(open(path)?, weights_col)
}

/// Open `path` and read a data-quality table from it.
pub fn load_data_quality(path: &Path) -> Result<DataQuality, AppError> {
    read_data_quality(open(path)?)
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

/// Raw table: normalized header names and string cells.
struct Table {
    headers: Vec<String>,
    header_map: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl Table {
    fn read<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
            .iter()
            .map(normalize_header_name)
            .collect();
        let header_map = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // records() starts at line 2 of the file
            let line = idx + 2;
            let record =
                result.map_err(|e| AppError::new(2, format!("line {line}: CSV parse error: {e}")))?;
            records.push(record);
        }

        Ok(Self {
            headers,
            header_map,
            records,
        })
    }

    fn require(&self, name: &str) -> Result<usize, AppError> {
        self.header_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
    }

    fn floats(&self, col: usize) -> Result<Vec<f64>, AppError> {
        let name = &self.headers[col];
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                parse_cell(record.get(col).unwrap_or(""))
                    .map_err(|e| AppError::new(2, format!("line {}: `{name}`: {e}", idx + 2)))
            })
            .collect()
    }

    fn timestamps(&self, col: usize) -> Result<Vec<DateTime<Utc>>, AppError> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                parse_timestamp(record.get(col).unwrap_or(""))
                    .map_err(|e| AppError::new(2, format!("line {}: `start`: {e}", idx + 2)))
            })
            .collect()
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// `hdd_65` → `(Hdd, 65.0)`; anything else → `None`.
pub fn parse_degree_day_header(name: &str) -> Option<(DegreeDayKind, f64)> {
    let (kind, rest) = if let Some(rest) = name.strip_prefix("hdd_") {
        (DegreeDayKind::Hdd, rest)
    } else if let Some(rest) = name.strip_prefix("cdd_") {
        (DegreeDayKind::Cdd, rest)
    } else {
        return None;
    };
    let balance_point = rest.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some((kind, balance_point))
}

fn parse_cell(s: &str) -> Result<f64, String> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    s.parse::<f64>()
        .map_err(|_| format!("invalid number '{s}'"))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Bare dates are taken as midnight UTC.
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{s}' (expected RFC 3339 or YYYY-MM-DD)"))
}

/// Read a design matrix.
///
/// `weights_col`, when given, must name an existing column.
pub fn read_design_matrix<R: Read>(
    reader: R,
    weights_col: Option<&str>,
) -> Result<DesignMatrix, AppError> {
    let table = Table::read(reader)?;
    let n = table.records.len();

    let index = match table.header_map.get("start") {
        Some(&col) => PeriodIndex::Time(table.timestamps(col)?),
        None => PeriodIndex::Ordinal(n),
    };
    let meter_value = table.floats(table.require("meter_value")?)?;
    let mut data = DesignMatrix::new(index).with_meter_values(meter_value)?;

    for (col, name) in table.headers.iter().enumerate() {
        if let Some((kind, balance_point)) = parse_degree_day_header(name) {
            data = data.with_degree_days(kind, balance_point, table.floats(col)?)?;
        }
    }
    if let Some(&col) = table.header_map.get("n_days") {
        data = data.with_n_days(table.floats(col)?)?;
    }
    if let Some(name) = weights_col {
        let col = table.require(&normalize_header_name(name))?;
        data = data.with_weights(table.floats(col)?)?;
    }

    log::debug!(
        "read design matrix: {} rows, {} degree-day columns",
        data.len(),
        data.degree_day_columns().len()
    );
    Ok(data)
}

/// Read a data-quality table (time index required).
pub fn read_data_quality<R: Read>(reader: R) -> Result<DataQuality, AppError> {
    let table = Table::read(reader)?;
    let index = table.timestamps(table.require("start")?)?;
    let meter_value = table.floats(table.require("meter_value")?)?;
    let temperature_null = table.floats(table.require("temperature_null")?)?;
    let temperature_not_null = table.floats(table.require("temperature_not_null")?)?;
    Ok(DataQuality::new(
        index,
        meter_value,
        temperature_null,
        temperature_not_null,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_day_headers() {
        assert_eq!(
            parse_degree_day_header("hdd_60"),
            Some((DegreeDayKind::Hdd, 60.0))
        );
        assert_eq!(
            parse_degree_day_header("cdd_65.5"),
            Some((DegreeDayKind::Cdd, 65.5))
        );
        assert_eq!(parse_degree_day_header("hdd_"), None);
        assert_eq!(parse_degree_day_header("meter_value"), None);
    }

    #[test]
    fn design_matrix_with_time_index() {
        let csv = "\u{feff}Start,meter_value,cdd_65,hdd_60\n\
                   2020-01-01T00:00:00Z,10,0,5\n\
                   2020-01-02,,1,\n\
                   2020-01-03T00:00:00+00:00,12,2,3\n";
        let dm = read_design_matrix(csv.as_bytes(), None).unwrap();
        assert_eq!(dm.len(), 3);
        assert!(dm.index().as_time().is_some());
        assert!(dm.meter_value().unwrap()[1].is_nan());
        assert_eq!(dm.balance_points(DegreeDayKind::Cdd), vec![65.0]);
        assert!(dm.degree_days(DegreeDayKind::Hdd, 60.0).unwrap()[1].is_nan());
        assert_eq!(dm.days_per_period().unwrap()[0], 1.0);
    }

    #[test]
    fn ordinal_index_with_weights() {
        let csv = "meter_value,n_days,w\n1,30,2\n2,31,1\n";
        let dm = read_design_matrix(csv.as_bytes(), Some("W")).unwrap();
        assert_eq!(dm.index(), &PeriodIndex::Ordinal(2));
        assert_eq!(dm.n_days(), Some(&[30.0, 31.0][..]));
        assert_eq!(dm.weights(), Some(&[2.0, 1.0][..]));
    }

    #[test]
    fn schema_errors_have_exit_code_2() {
        let err = read_design_matrix("cdd_65\n1\n".as_bytes(), None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("meter_value"));

        let err = read_design_matrix("meter_value\nabc\n".as_bytes(), None).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = read_design_matrix("meter_value\n1\n".as_bytes(), Some("weights")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn data_quality_table() {
        let csv = "start,meter_value,temperature_null,temperature_not_null\n\
                   2020-01-01,1,0,24\n\
                   2020-01-02,-1,2,22\n";
        let dq = read_data_quality(csv.as_bytes()).unwrap();
        assert_eq!(dq.len(), 2);

        let err = read_data_quality("meter_value\n1\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("start"));
    }
}
