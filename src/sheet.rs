//! Rendering of one report sheet.
//!
//! Layout, top to bottom: the logo at A1, the summary block (total time,
//! hourly rate, total due and a hidden row with decimal hours), a gap, then
//! the records as a worksheet table.

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Formula, Image, Table, TableColumn, TableStyle,
    Worksheet,
};
use tracing::{debug, warn};

use crate::config::SheetLayout;
use crate::error::Result;
use crate::input::CellValue;
use crate::normalize::{Column, NormalizedRecord};
use crate::summary::Summary;

pub const MAX_SHEET_NAME_LEN: usize = 31;
pub const EMPTY_CLIENT_SHEET_NAME: &str = "SEM CLIENTE";
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const MAX_COLUMN_WIDTH: usize = 255;

const LABEL_TOTAL_TIME: &str = "HORAS TOTAIS";
const LABEL_RATE: &str = "VALOR HORA";
const LABEL_TOTAL_DUE: &str = "TOTAL MENSAL";

/// Makes a client id usable as a sheet name: forbidden characters become
/// `_` and the result is cut to 31 characters.
pub fn sheet_name(client_id: &str) -> String {
    let cleaned: String = client_id
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let truncated: String = cleaned
        .trim_start_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let name = truncated.trim_end_matches('\'');
    if name.is_empty() {
        EMPTY_CLIENT_SHEET_NAME.to_string()
    } else if name.eq_ignore_ascii_case("history") {
        // reserved by Excel
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Excel reference (`B9`) of a 0-based row in column B.
fn b_cell(row: u32) -> String {
    format!("B{}", row + 1)
}

/// `value` as the `#,##0.00` number format shows it, e.g. `12,345.67`.
fn grouped_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(fixed.len() + int.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (i, digit) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(frac);
    grouped
}

struct Formats {
    label: Format,
    value: Format,
    money: Format,
    header: Format,
    body: Format,
}

impl Formats {
    fn new(layout: &SheetLayout) -> Self {
        let border_color = Color::RGB(layout.border_color);
        let bordered = Format::new()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color)
            .set_text_wrap()
            .set_align(FormatAlign::VerticalCenter);

        let centered = bordered.clone().set_align(FormatAlign::Center);
        let emphasized = if layout.header_bold {
            centered
                .clone()
                .set_bold()
                .set_font_color(Color::Black)
                .set_background_color(Color::RGB(layout.header_fill))
        } else {
            centered.clone()
        };

        Self {
            label: emphasized.clone(),
            value: centered.clone(),
            money: centered.set_num_format(&layout.rate_num_format),
            header: emphasized,
            body: bordered,
        }
    }
}

/// Tracks the longest rendered value per column.
struct ColumnWidths(Vec<usize>);

impl ColumnWidths {
    fn observe(&mut self, col: usize, text: &str) {
        if col >= self.0.len() {
            self.0.resize(col + 1, 0);
        }
        let len = text.chars().count();
        if len > self.0[col] {
            self.0[col] = len;
        }
    }

    fn apply(&self, worksheet: &mut Worksheet, padding: usize) -> Result<()> {
        for (col, len) in self.0.iter().enumerate() {
            if *len == 0 {
                continue;
            }
            let width = (len + padding).min(MAX_COLUMN_WIDTH);
            worksheet.set_column_width(col as u16, width as f64)?;
        }
        Ok(())
    }
}

pub struct RenderedSheet {
    pub worksheet: Worksheet,
    pub summary: Summary,
    pub table_name: String,
    pub data_rows: usize,
    /// Identifier to hand to the next sheet of the same workbook.
    pub next_table_id: u32,
}

pub struct SheetRenderer<'a> {
    layout: &'a SheetLayout,
    formats: Formats,
    logo: Option<Image>,
}

impl<'a> SheetRenderer<'a> {
    /// `logo` is decoded once here; bytes the writer cannot use are dropped
    /// with a warning and the sheets go without an image.
    pub fn new(layout: &'a SheetLayout, logo: Option<&[u8]>) -> Self {
        let logo = logo.and_then(|bytes| match Image::new_from_buffer(bytes) {
            Ok(image) => Some(image.set_scale_to_size(layout.logo_size, layout.logo_size, false)),
            Err(e) => {
                warn!(error = %e, "logo is not a usable image, skipping it");
                None
            }
        });
        Self {
            layout,
            formats: Formats::new(layout),
            logo,
        }
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// Renders `records` into a new worksheet called `name`.
    ///
    /// `table_id` must be unique within the workbook; the returned
    /// [`RenderedSheet::next_table_id`] is the one to use next.
    pub fn render(
        &self,
        name: &str,
        columns: &[Column],
        records: &[&NormalizedRecord],
        rate: f64,
        table_id: u32,
    ) -> Result<RenderedSheet> {
        let layout = self.layout;
        let mut worksheet = Worksheet::new();
        worksheet.set_name(name)?;

        if let Some(logo) = &self.logo {
            if let Err(e) = worksheet.insert_image(0, 0, logo) {
                warn!(sheet = name, error = %e, "could not place logo");
            }
        }

        let duration_index = columns.iter().position(|c| *c == Column::Duration);
        let summary = Summary::for_records(records, duration_index, rate);
        let mut widths = ColumnWidths(vec![0; columns.len().max(2)]);

        // --- Summary block ---
        let time_row = layout.summary_start_row;
        let rate_row = time_row + 1;
        let due_row = time_row + 2;
        let hours_row = time_row + 3;

        worksheet.write_string_with_format(time_row, 0, LABEL_TOTAL_TIME, &self.formats.label)?;
        worksheet.write_string_with_format(time_row, 1, &summary.total_time, &self.formats.value)?;
        worksheet.write_string_with_format(rate_row, 0, LABEL_RATE, &self.formats.label)?;
        worksheet.write_number_with_format(rate_row, 1, rate, &self.formats.money)?;
        worksheet.write_string_with_format(due_row, 0, LABEL_TOTAL_DUE, &self.formats.label)?;

        let total_due = summary.total_due();
        let formula = Formula::new(format!("={}*{}", b_cell(hours_row), b_cell(rate_row)))
            .set_result(total_due.to_string());
        worksheet.write_formula_with_format(due_row, 1, formula, &self.formats.money)?;

        worksheet.write_number(hours_row, 1, summary.decimal_hours)?;
        worksheet.set_row_hidden(hours_row)?;

        for label in [LABEL_TOTAL_TIME, LABEL_RATE, LABEL_TOTAL_DUE] {
            widths.observe(0, label);
        }
        widths.observe(1, &summary.total_time);
        widths.observe(1, &grouped_amount(rate));
        widths.observe(1, &grouped_amount(total_due));

        // --- Data table ---
        let header_row = layout.summary_start_row + layout.table_offset;
        let last_col = (columns.len().max(1) - 1) as u16;
        // A worksheet table needs one body row, even for an empty partition.
        let last_row = header_row + (records.len().max(1) as u32);

        let table_name = format!("{}{}", layout.table_prefix, table_id);
        let table_columns: Vec<TableColumn> = columns
            .iter()
            .map(|c| TableColumn::new().set_header(c.header()))
            .collect();
        let table = Table::new()
            .set_name(&table_name)
            .set_style(TableStyle::Medium9)
            .set_banded_rows(true)
            .set_first_column(false)
            .set_last_column(false)
            .set_columns(&table_columns);
        worksheet.add_table(header_row, 0, last_row, last_col, &table)?;

        // header cells are rewritten after add_table so they carry our format
        for (col, column) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, col as u16, column.header(), &self.formats.header)?;
            widths.observe(col, column.header());
        }

        for (offset, record) in records.iter().enumerate() {
            let row = header_row + 1 + offset as u32;
            for col in 0..columns.len() {
                let value = record.value(col);
                self.write_cell(&mut worksheet, row, col as u16, value)?;
                widths.observe(col, &value.to_string());
            }
        }

        if layout.autofit {
            widths.apply(&mut worksheet, layout.autofit_padding)?;
        }

        debug!(
            sheet = name,
            table = %table_name,
            rows = records.len(),
            total_time = %summary.total_time,
            "sheet rendered"
        );

        Ok(RenderedSheet {
            worksheet,
            summary,
            table_name,
            data_rows: records.len(),
            next_table_id: table_id + 1,
        })
    }

    fn write_cell(&self, worksheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<()> {
        let format = &self.formats.body;
        match value {
            CellValue::Empty => worksheet.write_blank(row, col, format)?,
            CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, format)?,
            CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, format)?,
            CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, format)?,
            CellValue::DateTime(_) | CellValue::Duration(_) => {
                worksheet.write_string_with_format(row, col, value.to_string(), format)?
            }
        };
        Ok(())
    }
}
