use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that stop a report from being generated.
///
/// Field-level problems (an unparseable duration or date) never show up here;
/// they are absorbed by the normalizer.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("input needs at least two columns to derive the client, found {columns}")]
    InputShape { columns: usize },

    #[error("could not read input spreadsheet: {0}")]
    InputRead(#[from] calamine::Error),

    #[error("input spreadsheet has no worksheets")]
    EmptyWorkbook,

    #[error("file I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    Config { key: String, value: String },

    #[error("spreadsheet writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
