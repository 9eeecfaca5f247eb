//! Summing of `H:MM:SS` duration tokens.
//!
//! Entries that do not parse count as zero time. Negative values and
//! minute/second components outside `0..60` are treated as unparseable.

use tracing::debug;

/// Sum of a sequence of durations, kept in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationTotal {
    pub seconds: f64,
}

impl DurationTotal {
    /// `HH:MM:SS`, hours zero-padded to two digits but never capped.
    pub fn hms(&self) -> String {
        let total = self.seconds.max(0.0);
        let hours = (total / 3600.0).floor() as u64;
        let minutes = ((total % 3600.0) / 60.0).floor() as u64;
        let seconds = (total % 60.0).floor() as u64;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }

    pub fn decimal_hours(&self) -> f64 {
        self.seconds / 3600.0
    }
}

/// Parses one `H:MM:SS[.fff]` token into seconds.
pub fn parse_duration(token: &str) -> Option<f64> {
    let mut parts = token.trim().split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    if h.is_empty() || !h.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if m.len() != 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.len() != 2 || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: f64 = h.parse().ok()?;
    let minutes: f64 = m.parse().ok()?;
    let seconds: f64 = if frac.is_empty() { whole.parse().ok()? } else { s.parse().ok()? };
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Adds up every token; unparseable ones contribute nothing.
pub fn total_duration<'a, I>(values: I) -> DurationTotal
where
    I: IntoIterator<Item = &'a str>,
{
    let seconds = values
        .into_iter()
        .map(|value| {
            parse_duration(value).unwrap_or_else(|| {
                debug!(value, "duration not recognised, counting as zero");
                0.0
            })
        })
        .sum();
    DurationTotal { seconds }
}

/// Returns the `HH:MM:SS` rendering together with decimal hours.
pub fn sum_durations<'a, I>(values: I) -> (String, f64)
where
    I: IntoIterator<Item = &'a str>,
{
    let total = total_duration(values);
    (total.hms(), total.decimal_hours())
}
