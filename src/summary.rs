//! Time and billing totals for one partition.

use crate::duration::total_duration;
use crate::normalize::NormalizedRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// `HH:MM:SS`
    pub total_time: String,
    pub decimal_hours: f64,
    pub rate: f64,
}

impl Summary {
    /// `duration_index` is the position of the duration column, if the input
    /// had one; without it the partition totals zero.
    pub fn for_records(records: &[&NormalizedRecord], duration_index: Option<usize>, rate: f64) -> Self {
        let durations: Vec<String> = match duration_index {
            Some(i) => records.iter().map(|r| r.value(i).to_string()).collect(),
            None => Vec::new(),
        };
        let total = total_duration(durations.iter().map(String::as_str));

        Summary {
            total_time: total.hms(),
            decimal_hours: total.decimal_hours(),
            rate,
        }
    }

    pub fn total_due(&self) -> f64 {
        self.decimal_hours * self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CellValue;

    fn entry(duration: &str) -> NormalizedRecord {
        NormalizedRecord {
            client_id: "ACME".into(),
            values: vec![CellValue::text("ACME"), CellValue::text(duration)],
        }
    }

    #[test]
    fn total_due_is_hours_times_rate() {
        let summary = Summary {
            total_time: "02:00:00".into(),
            decimal_hours: 2.0,
            rate: 462.62,
        };
        assert!((summary.total_due() - 925.24).abs() < 1e-9);
    }

    #[test]
    fn sums_the_duration_column() {
        let records = [entry("01:00:00"), entry("-"), entry("00:30:00")];
        let refs: Vec<&NormalizedRecord> = records.iter().collect();
        let summary = Summary::for_records(&refs, Some(1), 100.0);

        assert_eq!(summary.total_time, "01:30:00");
        assert!((summary.decimal_hours - 1.5).abs() < 1e-9);
        assert!((summary.total_due() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn missing_duration_column_totals_zero() {
        let records = [entry("01:00:00")];
        let refs: Vec<&NormalizedRecord> = records.iter().collect();
        let summary = Summary::for_records(&refs, None, 462.62);
        assert_eq!(summary.total_time, "00:00:00");
        assert_eq!(summary.total_due(), 0.0);
    }
}
