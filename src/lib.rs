//! Per-client billing workbooks from a raw time-tracking export.
//!
//! The pipeline is: [`input::read_raw_table`] → [`normalize::normalize`] →
//! [`partition::partitions`] → [`sheet::SheetRenderer`] (once per partition)
//! → [`workbook::build_report`].

pub mod config;
pub mod duration;
pub mod error;
pub mod input;
pub mod logo;
pub mod normalize;
pub mod partition;
pub mod sheet;
pub mod summary;
pub mod workbook;

pub use config::{LogoSource, ReportConfig, SheetLayout};
pub use error::{ReportError, Result};
pub use input::{CellValue, RawTable};
pub use normalize::{Column, NormalizedRecord, NormalizedTable};
pub use workbook::{Report, build_report, generate};
