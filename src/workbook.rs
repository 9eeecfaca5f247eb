//! Assembly of the complete report workbook.

use std::{collections::HashSet, path::Path};

use rust_xlsxwriter::Workbook;
use tracing::info;

use crate::config::{ReportConfig, SheetLayout};
use crate::error::{ReportError, Result};
use crate::logo::load_logo;
use crate::normalize::NormalizedTable;
use crate::partition::{PartitionKey, partitions};
use crate::sheet::{MAX_SHEET_NAME_LEN, SheetRenderer, sheet_name};
use crate::summary::Summary;

/// A serialized report.
#[derive(Debug, Clone)]
pub struct Report {
    pub bytes: Vec<u8>,
    /// In workbook order, the overview first.
    pub sheet_names: Vec<String>,
    pub summaries: Vec<Summary>,
}

impl Report {
    /// Overview plus one sheet per distinct client.
    pub fn sheet_count(&self) -> usize {
        self.sheet_names.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Sheet names already handed out in one workbook. Excel compares them
/// case-insensitively.
#[derive(Debug, Default)]
struct SheetNames(HashSet<String>);

impl SheetNames {
    /// Returns `name`, or `name` with a numeric suffix when it is taken. The
    /// base is shortened so the result still fits the 31 character limit.
    fn claim(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut n = 0u32;
        while self.0.contains(&candidate.to_lowercase()) {
            n += 1;
            let suffix = n.to_string();
            let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.len());
            let base: String = name.chars().take(keep).collect();
            candidate = format!("{}{}", base.trim_end_matches('\''), suffix);
        }
        self.0.insert(candidate.to_lowercase());
        candidate
    }
}

/// Renders the overview and every client sheet, then serializes.
///
/// `logo` failures are the caller's concern; a missing or unusable image only
/// means sheets without it.
pub fn build_report(
    table: &NormalizedTable,
    rate: f64,
    logo: Option<&[u8]>,
    layout: &SheetLayout,
) -> Result<Report> {
    let renderer = SheetRenderer::new(layout, logo);
    let mut workbook = Workbook::new();
    let mut names = SheetNames::default();
    let mut sheet_names = Vec::new();
    let mut summaries = Vec::new();
    let mut table_id = 1;

    for partition in partitions(&table.records) {
        let wanted = match &partition.key {
            PartitionKey::Overview => layout.overview_name.clone(),
            PartitionKey::Client(id) => sheet_name(id),
        };
        let name = names.claim(&wanted);

        let rendered = renderer.render(&name, &table.columns, &partition.records, rate, table_id)?;
        table_id = rendered.next_table_id;

        workbook.push_worksheet(rendered.worksheet);
        sheet_names.push(name);
        summaries.push(rendered.summary);
    }

    let bytes = workbook.save_to_buffer()?;
    info!(
        sheets = sheet_names.len(),
        bytes = bytes.len(),
        logo = renderer.has_logo(),
        "report workbook serialized"
    );

    Ok(Report {
        bytes,
        sheet_names,
        summaries,
    })
}

/// Loads the logo as configured and builds the report.
pub fn generate(table: &NormalizedTable, config: &ReportConfig) -> Result<Report> {
    let logo = load_logo(&config.logo, config.logo_timeout);
    build_report(table, config.rate, logo.as_deref(), &config.layout)
}
