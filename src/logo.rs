//! Loading the logo placed on every sheet.
//!
//! The logo is decoration: when it cannot be loaded the report is still
//! produced, just without the image.

use std::{io, path::PathBuf, time::Duration};

use reqwest::{StatusCode, blocking::Client};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LogoSource;

#[derive(Debug, Error)]
pub enum LogoError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("logo server answered {0}")]
    Status(StatusCode),

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn fetch_logo(url: &str, timeout: Duration) -> Result<Vec<u8>, LogoError> {
    let client = Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(LogoError::Status(status));
    }
    Ok(response.bytes()?.to_vec())
}

pub fn try_load(source: &LogoSource, timeout: Duration) -> Result<Option<Vec<u8>>, LogoError> {
    match source {
        LogoSource::Disabled => Ok(None),
        LogoSource::Url(url) => fetch_logo(url, timeout).map(Some),
        LogoSource::File(path) => std::fs::read(path)
            .map(Some)
            .map_err(|source| LogoError::Io {
                path: path.clone(),
                source,
            }),
    }
}

/// Loads the logo once per run. Failures are logged and yield `None`.
pub fn load_logo(source: &LogoSource, timeout: Duration) -> Option<Vec<u8>> {
    match try_load(source, timeout) {
        Ok(Some(bytes)) => {
            info!(bytes = bytes.len(), "logo loaded");
            Some(bytes)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "logo unavailable, sheets will be generated without it");
            None
        }
    }
}
