//! Turns raw export rows into report rows.
//!
//! The client is always derived from the first two columns by position,
//! whatever they are called. The remaining output columns are picked by name
//! from a fixed list and appear in that list's order.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::{debug, info};

use crate::error::{ReportError, Result};
use crate::input::{CellValue, RawTable, excel_epoch};

/// Written into the duration column when the source cell is missing.
pub const MISSING_DURATION: &str = "-";

/// Output columns, in the order they appear on every sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Client,
    Duration,
    StartDate,
    Executor,
    Description,
    CaseNumber,
    OpposingParty,
    Folder,
}

impl Column {
    pub const CANONICAL: [Column; 8] = [
        Column::Client,
        Column::Duration,
        Column::StartDate,
        Column::Executor,
        Column::Description,
        Column::CaseNumber,
        Column::OpposingParty,
        Column::Folder,
    ];

    /// Header text, matched exactly against the input header row.
    pub fn header(self) -> &'static str {
        match self {
            Column::Client => "CLIENTES",
            Column::Duration => "Duração",
            Column::StartDate => "Data de início",
            Column::Executor => "Executante",
            Column::Description => "Descrição",
            Column::CaseNumber => "Vínculos com processo / Número de CNJ",
            Column::OpposingParty => "Contrário principal / Nome/razão social",
            Column::Folder => "Vínculos com processo / Pasta",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub client_id: String,
    /// One value per entry of [`NormalizedTable::columns`].
    pub values: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub columns: Vec<Column>,
    pub records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    pub fn column_index(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn headers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.header())
    }
}

impl NormalizedRecord {
    pub fn value(&self, index: usize) -> &CellValue {
        self.values.get(index).unwrap_or(&CellValue::Empty)
    }
}

/// `trim(first + " " + second)`, missing cells read as empty text.
pub fn client_id(first: &CellValue, second: &CellValue) -> String {
    format!("{} {}", first, second).trim().to_string()
}

/// Keeps only the last whitespace-delimited token, e.g. the time part of
/// `"2024-01-05 01:23:45"`.
pub fn normalize_duration(value: &CellValue) -> CellValue {
    let rendered = match value {
        CellValue::Empty => MISSING_DURATION.to_string(),
        other => other.to_string(),
    };
    let token = rendered
        .split_whitespace()
        .last()
        .unwrap_or(MISSING_DURATION);
    CellValue::text(token)
}

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// `YYYY-MM-DD`, or empty when the value is not a recognisable date.
pub fn normalize_start_date(value: &CellValue) -> CellValue {
    let date = match value {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date_text(s.trim()),
        CellValue::Number(serial) => excel_serial_date(*serial),
        _ => None,
    };
    match date {
        Some(d) => CellValue::Text(d.format("%Y-%m-%d").to_string()),
        None => {
            if !value.is_empty() {
                debug!(%value, "start date not recognised, leaving it empty");
            }
            CellValue::Empty
        }
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    // 2958465 is 9999-12-31, the last day Excel can represent.
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    TimeDelta::try_milliseconds(millis).map(|delta| (excel_epoch() + delta).date())
}

/// Derives client ids, selects the canonical columns and coerces durations
/// and dates. Rows are never dropped or reordered.
pub fn normalize(raw: &RawTable) -> Result<NormalizedTable> {
    if raw.headers.len() < 2 {
        return Err(ReportError::InputShape {
            columns: raw.headers.len(),
        });
    }

    let mut columns = vec![Column::Client];
    let mut sources = vec![None];
    for column in Column::CANONICAL.into_iter().skip(1) {
        if let Some(index) = raw.column_index(column.header()) {
            columns.push(column);
            sources.push(Some(index));
        }
    }

    let records: Vec<NormalizedRecord> = (0..raw.rows.len())
        .map(|row| {
            let client_id = client_id(raw.cell(row, 0), raw.cell(row, 1));
            let values = columns
                .iter()
                .zip(&sources)
                .map(|(column, source)| match (column, source) {
                    (Column::Client, _) => CellValue::text(client_id.clone()),
                    (_, None) => CellValue::Empty,
                    (Column::Duration, Some(i)) => normalize_duration(raw.cell(row, *i)),
                    (Column::StartDate, Some(i)) => normalize_start_date(raw.cell(row, *i)),
                    (_, Some(i)) => raw.cell(row, *i).clone(),
                })
                .collect();
            NormalizedRecord { client_id, values }
        })
        .collect();

    info!(
        records = records.len(),
        columns = columns.len(),
        "records normalized"
    );
    Ok(NormalizedTable { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    #[test]
    fn client_id_joins_and_trims_ends_only() {
        assert_eq!(client_id(&text("ACME"), &text("Ltda")), "ACME Ltda");
        assert_eq!(client_id(&text("ACME"), &CellValue::Empty), "ACME");
        assert_eq!(client_id(&CellValue::Empty, &text("Ltda")), "Ltda");
        assert_eq!(client_id(&text("A "), &text("B")), "A  B");
        assert_eq!(client_id(&CellValue::Empty, &CellValue::Empty), "");
        assert_eq!(client_id(&CellValue::Number(12.0), &text("X")), "12 X");
    }

    #[test]
    fn duration_keeps_last_token() {
        assert_eq!(normalize_duration(&text("Tempo gasto 01:23:45")), text("01:23:45"));
        assert_eq!(normalize_duration(&text("00:10:00")), text("00:10:00"));
        assert_eq!(normalize_duration(&CellValue::Empty), text(MISSING_DURATION));
        assert_eq!(normalize_duration(&text("   ")), text(MISSING_DURATION));
        assert_eq!(
            normalize_duration(&CellValue::Duration(TimeDelta::seconds(3 * 3600 + 61))),
            text("3:01:01")
        );
    }

    #[test]
    fn start_date_is_reformatted_or_emptied() {
        assert_eq!(normalize_start_date(&text("2024-02-29 14:00:00")), text("2024-02-29"));
        assert_eq!(normalize_start_date(&text("05/03/2024")), text("2024-03-05"));
        assert_eq!(normalize_start_date(&text("05/03/2024 08:30")), text("2024-03-05"));
        assert_eq!(normalize_start_date(&text("2024-03-05T10:00:00-03:00")), text("2024-03-05"));
        assert_eq!(normalize_start_date(&CellValue::Number(45292.0)), text("2024-01-01"));
        assert_eq!(normalize_start_date(&text("amanhã")), CellValue::Empty);
        assert_eq!(normalize_start_date(&CellValue::Empty), CellValue::Empty);
        assert_eq!(normalize_start_date(&CellValue::Bool(true)), CellValue::Empty);
    }

    #[test]
    fn fewer_than_two_columns_is_rejected() {
        let raw = table(&["Cliente"], vec![vec![text("ACME")]]);
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, ReportError::InputShape { columns: 1 }));
    }

    #[test]
    fn keeps_present_columns_in_canonical_order() {
        let raw = table(
            &["Nome", "Sobrenome", "Executante", "Extra", "Duração"],
            vec![
                vec![text("ACME"), text("SA"), text("Ana"), text("x"), text("Dia 01:00:00")],
                vec![text("Beta"), CellValue::Empty, text("Rui"), text("y"), CellValue::Empty],
            ],
        );
        let normalized = normalize(&raw).unwrap();

        assert_eq!(
            normalized.columns,
            vec![Column::Client, Column::Duration, Column::Executor]
        );
        assert_eq!(normalized.records.len(), 2);
        assert_eq!(normalized.records[0].client_id, "ACME SA");
        assert_eq!(
            normalized.records[0].values,
            vec![text("ACME SA"), text("01:00:00"), text("Ana")]
        );
        assert_eq!(normalized.records[1].client_id, "Beta");
        assert_eq!(normalized.records[1].values[1], text(MISSING_DURATION));
    }

    #[test]
    fn header_only_input_yields_no_records() {
        let raw = table(&["a", "b", "Duração"], vec![]);
        let normalized = normalize(&raw).unwrap();
        assert!(normalized.records.is_empty());
        assert_eq!(normalized.column_index(Column::Duration), Some(1));
    }
}
