//! Reading the raw time-tracking export.
//!
//! Only the first worksheet is used. Its first row holds the column names and
//! every following row becomes one [`RawRecord`].

use std::{fmt, io::Cursor, iter, path::Path};

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{Datelike, NaiveDateTime, TimeDelta};
use tracing::{debug, info};

use crate::error::{ReportError, Result};

/// A single cell as read from the input, or as written to the report.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => {
                // Excel stores a bare time as a fraction of day zero.
                if dt.year() < 1900 {
                    write!(f, "{}", dt.format("%H:%M:%S"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Duration(d) => {
                let secs = d.num_seconds();
                let sign = if secs < 0 { "-" } else { "" };
                let secs = secs.unsigned_abs();
                write!(f, "{}{}:{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60, secs % 60)
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// 1899-12-30, day zero of the 1900 date system as Excel actually counts it.
pub(crate) fn excel_epoch() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// One input row, positionally aligned with [`RawTable::headers`].
pub type RawRecord = Vec<CellValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `(row, col)`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }
}

/// Decodes an `.xlsx`/`.xls`/`.ods` byte stream.
pub fn read_raw_table(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReportError::EmptyWorkbook)??;
    let table = table_from_range(&range);
    info!(
        rows = table.rows.len(),
        columns = table.headers.len(),
        "input spreadsheet loaded"
    );
    Ok(table)
}

pub fn read_raw_table_from_path(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_raw_table(&bytes)
}

/// calamine trims blank leading columns off the range; they are put back so
/// that column positions match the sheet. Blank leading rows stay skipped and
/// the first non-empty row is the header.
fn table_from_range(range: &Range<Data>) -> RawTable {
    let left = range.start().map_or(0, |(_, col)| col as usize);
    if left > 0 {
        debug!(blank_columns = left, "input starts after column A");
    }
    let padded = |row: &[Data]| -> RawRecord {
        iter::repeat_n(CellValue::Empty, left)
            .chain(row.iter().map(cell_value))
            .collect()
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => padded(header).iter().map(ToString::to_string).collect(),
        None => return RawTable::default(),
    };
    let rows: Vec<RawRecord> = rows.map(padded).collect();
    debug!(?headers, "input header row");
    RawTable { headers, rows }
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                dt.as_duration()
                    .map(CellValue::Duration)
                    .unwrap_or(CellValue::Number(dt.as_f64()))
            } else {
                dt.as_datetime()
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
