//! Run configuration.
//!
//! Defaults can be overridden from the environment (a `.env` file is read by
//! the binary) and then again from command line flags.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::{ReportError, Result};

pub const DEFAULT_HOURLY_RATE: f64 = 462.62;
pub const DEFAULT_LOGO_URL: &str = "https://media.licdn.com/dms/image/v2/C4D0BAQFynSl_Yj90cQ/company-logo_200_200/company-logo_200_200/0/1630472942468/vicente_monteiro_advogados_logo?e=2147483647&v=beta&t=HUb5xhVbshv-LGKYpmpkkuJfUxX30S5oMjefFv7jM4s";
pub const DEFAULT_OUTPUT_FILE: &str = "Planilha_Final_Clientes.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const OVERVIEW_SHEET_NAME: &str = "GERAL";

/// Visual constants of every generated sheet.
///
/// Rows are 0-based, as `rust_xlsxwriter` counts them.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    /// Width and height of the logo in pixels. Both 120 and 150 have been
    /// used for this report; 120 is the default.
    pub logo_size: u32,
    /// First row of the summary block (row 8 in Excel).
    pub summary_start_row: u32,
    /// Distance from the summary start to the table header row.
    pub table_offset: u32,
    pub border_color: u32,
    pub header_fill: u32,
    pub header_bold: bool,
    pub rate_num_format: String,
    pub autofit: bool,
    pub autofit_padding: usize,
    pub overview_name: String,
    pub table_prefix: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            logo_size: 120,
            summary_start_row: 7,
            table_offset: 5,
            border_color: 0x000000,
            header_fill: 0xBDD7EE,
            header_bold: true,
            rate_num_format: "#,##0.00".to_string(),
            autofit: true,
            autofit_padding: 2,
            overview_name: OVERVIEW_SHEET_NAME.to_string(),
            table_prefix: "TABELA_".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogoSource {
    Url(String),
    File(PathBuf),
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub rate: f64,
    pub logo: LogoSource,
    pub logo_timeout: Duration,
    pub output: PathBuf,
    pub layout: SheetLayout,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_HOURLY_RATE,
            logo: LogoSource::Url(DEFAULT_LOGO_URL.to_string()),
            logo_timeout: Duration::from_secs(10),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            layout: SheetLayout::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(rate) = parse_var::<f64, _>(&lookup, "HOURLY_RATE")? {
            config.rate = rate;
        }

        if let Some(path) = lookup("LOGO_FILE").filter(|v| !v.trim().is_empty()) {
            config.logo = LogoSource::File(PathBuf::from(path));
        } else if let Some(url) = lookup("LOGO_URL") {
            config.logo = if url.trim().is_empty() {
                LogoSource::Disabled
            } else {
                LogoSource::Url(url.trim().to_string())
            };
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "LOGO_TIMEOUT_SECS")? {
            config.logo_timeout = Duration::from_secs(secs);
        }
        if let Some(output) = lookup("OUTPUT_FILE").filter(|v| !v.trim().is_empty()) {
            config.output = PathBuf::from(output);
        }

        let layout = &mut config.layout;
        if let Some(size) = parse_var::<u32, _>(&lookup, "LOGO_SIZE")? {
            layout.logo_size = size;
        }
        if let Some(autofit) = parse_bool(&lookup, "AUTOFIT_COLUMNS")? {
            layout.autofit = autofit;
        }
        if let Some(bold) = parse_bool(&lookup, "HEADER_BOLD")? {
            layout.header_bold = bold;
        }
        if let Some(color) = parse_color(&lookup, "BORDER_COLOR")? {
            layout.border_color = color;
        }
        if let Some(color) = parse_color(&lookup, "HEADER_FILL_COLOR")? {
            layout.header_fill = color;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would produce a broken report, whichever source
    /// they came from. Run again after command line overrides.
    pub fn validate(&self) -> Result<()> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(invalid("HOURLY_RATE", &self.rate.to_string()));
        }
        if self.layout.logo_size == 0 {
            return Err(invalid("LOGO_SIZE", "0"));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ReportError {
    ReportError::Config {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, &raw)),
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(invalid(key, &raw)),
        },
    }
}

/// Accepts `RRGGBB` with or without a leading `#`.
fn parse_color<F>(lookup: &F, key: &str) -> Result<Option<u32>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => {
            let hex = raw.trim().trim_start_matches('#');
            if hex.len() != 6 {
                return Err(invalid(key, &raw));
            }
            u32::from_str_radix(hex, 16)
                .map(Some)
                .map_err(|_| invalid(key, &raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ReportConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.rate, 462.62);
        assert_eq!(config.layout.logo_size, 120);
        assert_eq!(config.output, PathBuf::from("Planilha_Final_Clientes.xlsx"));
    }

    #[test]
    fn environment_overrides() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("HOURLY_RATE", "300.5"),
            ("LOGO_SIZE", "150"),
            ("LOGO_URL", ""),
            ("AUTOFIT_COLUMNS", "no"),
            ("BORDER_COLOR", "#FF0000"),
            ("LOGO_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.rate, 300.5);
        assert_eq!(config.layout.logo_size, 150);
        assert_eq!(config.logo, LogoSource::Disabled);
        assert!(!config.layout.autofit);
        assert_eq!(config.layout.border_color, 0xFF0000);
        assert_eq!(config.logo_timeout, Duration::from_secs(3));
    }

    #[test]
    fn logo_file_wins_over_url() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("LOGO_FILE", "logo.png"),
            ("LOGO_URL", "https://example.com/logo.png"),
        ]))
        .unwrap();
        assert_eq!(config.logo, LogoSource::File(PathBuf::from("logo.png")));
    }

    #[test]
    fn bad_values_name_the_key() {
        let err = ReportConfig::from_lookup(lookup(&[("HOURLY_RATE", "abc")])).unwrap_err();
        assert!(matches!(err, ReportError::Config { ref key, .. } if key == "HOURLY_RATE"));

        let err = ReportConfig::from_lookup(lookup(&[("HOURLY_RATE", "-1")])).unwrap_err();
        assert!(matches!(err, ReportError::Config { .. }));

        let err = ReportConfig::from_lookup(lookup(&[("HEADER_FILL_COLOR", "blue")])).unwrap_err();
        assert!(matches!(err, ReportError::Config { ref key, .. } if key == "HEADER_FILL_COLOR"));

        let err = ReportConfig::from_lookup(lookup(&[("LOGO_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ReportError::Config { ref key, .. } if key == "LOGO_SIZE"));
    }

    #[test]
    fn overrides_after_loading_are_checked_too() {
        let mut config = ReportConfig::default();
        config.rate = -5.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReportError::Config { ref key, ref value } if key == "HOURLY_RATE" && value == "-5"));

        config.rate = f64::NAN;
        assert!(matches!(config.validate(), Err(ReportError::Config { .. })));

        config.rate = 0.0;
        assert!(config.validate().is_ok());

        config.layout.logo_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReportError::Config { ref key, .. } if key == "LOGO_SIZE"));
    }
}
