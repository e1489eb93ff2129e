use chrono::{Local, NaiveDate};

use crate::attempt::AttemptRecord;

/// Total seconds of timed training recorded on the given local calendar day.
/// Untimed attempts do not count toward the daily goal. Consumes the full
/// history (`ProgressStore::all`); rendering the progress bar is the host's
/// job.
pub fn seconds_trained_on(records: &[AttemptRecord], date: NaiveDate) -> f64 {
    records
        .iter()
        .filter(|r| r.seconds_allotted.is_some())
        .filter(|r| r.recorded_at.date_naive() == date)
        .map(|r| r.elapsed_ms as f64 / 1000.0)
        .sum()
}

pub fn seconds_trained_today(records: &[AttemptRecord]) -> f64 {
    seconds_trained_on(records, Local::now().date_naive())
}
