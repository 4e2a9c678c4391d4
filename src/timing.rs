use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::days_between;
use crate::submission::SubmissionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingCategory {
    SameDay,
    NextDay,
    WithinWeek,
    Late,
    NoSubmission,
}

impl TimingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingCategory::SameDay => "same_day",
            TimingCategory::NextDay => "next_day",
            TimingCategory::WithinWeek => "within_week",
            TimingCategory::Late => "late",
            TimingCategory::NoSubmission => "no_submission",
        }
    }

    pub fn from_delay(delay_days: i64) -> Self {
        match delay_days {
            i64::MIN..=0 => TimingCategory::SameDay,
            1 => TimingCategory::NextDay,
            2..=7 => TimingCategory::WithinWeek,
            _ => TimingCategory::Late,
        }
    }
}

/// Classify one planned visit against its site's submission state.
///
/// A submitted site without any usable timestamp cannot be timed and counts
/// as `NoSubmission`.
pub fn classify(planned: NaiveDate, state: &SubmissionState) -> TimingCategory {
    match (state.is_submitted, state.latest_update) {
        (true, Some(updated)) => TimingCategory::from_delay(days_between(planned, updated)),
        _ => TimingCategory::NoSubmission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn submitted_on(day: u32) -> SubmissionState {
        SubmissionState::submitted(Some(Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap()))
    }

    #[test]
    fn classifies_delay_scenarios() {
        let planned = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(classify(planned, &submitted_on(15)), TimingCategory::SameDay);
        assert_eq!(classify(planned, &submitted_on(16)), TimingCategory::NextDay);
        assert_eq!(classify(planned, &submitted_on(20)), TimingCategory::WithinWeek);
        assert_eq!(classify(planned, &submitted_on(25)), TimingCategory::Late);
        assert_eq!(
            classify(planned, &SubmissionState::not_submitted()),
            TimingCategory::NoSubmission
        );
    }

    #[test]
    fn early_completion_counts_as_same_day() {
        let planned = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(classify(planned, &submitted_on(3)), TimingCategory::SameDay);
    }

    #[test]
    fn week_boundaries() {
        assert_eq!(TimingCategory::from_delay(7), TimingCategory::WithinWeek);
        assert_eq!(TimingCategory::from_delay(8), TimingCategory::Late);
        assert_eq!(TimingCategory::from_delay(2), TimingCategory::WithinWeek);
    }

    #[test]
    fn submitted_without_timestamp_is_untimed() {
        let planned = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(
            classify(planned, &SubmissionState::submitted(None)),
            TimingCategory::NoSubmission
        );
    }
}
