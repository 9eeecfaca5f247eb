//! Checks on the OOXML parts of a generated report that calamine does not
//! expose: hidden rows, formulas, table options, styles and column widths.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use timesheet_report::{
    SheetLayout,
    input::{CellValue, RawTable},
    normalize::normalize,
    workbook::build_report,
};

fn raw_table() -> RawTable {
    let headers = ["Cliente", "Unidade", "Duração", "Data de início"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let row = |client: &str, duration: &str| {
        vec![
            CellValue::text(client),
            CellValue::text("SP"),
            CellValue::text(duration),
            CellValue::text("2024-01-02"),
        ]
    };
    RawTable::new(headers, vec![row("ACME", "01:30:00"), row("Beta", "00:30:00")])
}

fn report_bytes(layout: &SheetLayout) -> Vec<u8> {
    let table = normalize(&raw_table()).unwrap();
    build_report(&table, 462.62, None, layout).unwrap().bytes
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("open zip");
    let mut part = archive.by_name(name).unwrap_or_else(|_| panic!("missing {name}"));
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

/// The opening `<row ...>` tag of a 1-based Excel row.
fn row_tag(sheet_xml: &str, excel_row: u32) -> Option<&str> {
    let start = sheet_xml.find(&format!("<row r=\"{excel_row}\""))?;
    let end = start + sheet_xml[start..].find('>')?;
    Some(&sheet_xml[start..=end])
}

/// The `<c r="...">...</c>` element of one cell.
fn cell_xml<'a>(sheet_xml: &'a str, reference: &str) -> Option<&'a str> {
    let start = sheet_xml.find(&format!("<c r=\"{reference}\""))?;
    let end = start + sheet_xml[start..].find("</c>")?;
    Some(&sheet_xml[start..end + "</c>".len()])
}

#[test]
fn decimal_hours_row_is_hidden_and_feeds_the_total() {
    let bytes = report_bytes(&SheetLayout::default());
    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

    let hours = row_tag(&sheet, 11).expect("row 11 written");
    assert!(hours.contains("hidden=\"1\""), "{hours}");
    for visible in [8, 9, 10] {
        let tag = row_tag(&sheet, visible).expect("summary row written");
        assert!(!tag.contains("hidden"), "{tag}");
    }
    assert!(cell_xml(&sheet, "B11").unwrap().contains("<v>2</v>"));

    let total = cell_xml(&sheet, "B10").expect("B10 written");
    assert!(total.contains("<f>B11*B9</f>"), "{total}");
    assert!(total.contains("<v>925.24</v>"), "{total}");
}

#[test]
fn every_table_has_banded_rows_only() {
    let bytes = report_bytes(&SheetLayout::default());
    // GERAL, ACME SP, Beta SP
    for n in 1..=3 {
        let table = read_part(&bytes, &format!("xl/tables/table{n}.xml"));
        assert!(table.contains(&format!("name=\"TABELA_{n}\"")), "{table}");
        assert!(table.contains("TableStyleMedium9"));
        assert!(table.contains("showRowStripes=\"1\""));
        assert!(table.contains("showFirstColumn=\"0\""));
        assert!(table.contains("showLastColumn=\"0\""));
    }
}

#[test]
fn header_cells_are_bold_and_filled() {
    let bytes = report_bytes(&SheetLayout::default());
    let styles = read_part(&bytes, "xl/styles.xml");
    assert!(styles.contains("rgb=\"FFBDD7EE\""), "{styles}");
    assert!(styles.contains("<b/>"));

    let layout = SheetLayout {
        header_fill: 0x123456,
        ..SheetLayout::default()
    };
    let styles = read_part(&report_bytes(&layout), "xl/styles.xml");
    assert!(styles.contains("rgb=\"FF123456\""));
    assert!(!styles.contains("rgb=\"FFBDD7EE\""));
}

#[test]
fn column_widths_follow_the_autofit_switch() {
    let fitted = read_part(&report_bytes(&SheetLayout::default()), "xl/worksheets/sheet1.xml");
    assert!(fitted.contains("<cols>"));
    assert!(fitted.contains("customWidth=\"1\""));

    let layout = SheetLayout {
        autofit: false,
        ..SheetLayout::default()
    };
    let plain = read_part(&report_bytes(&layout), "xl/worksheets/sheet1.xml");
    assert!(!plain.contains("<cols>"));
    assert!(!plain.contains("customWidth"));
}
