use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

/// A week bucket key. Week 0 is the pre-week span between Jan 1 and the
/// year's first Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekId {
    pub year: i32,
    pub week: u32,
}

impl WeekId {
    pub fn is_pre_week(&self) -> bool {
        self.week == 0
    }

    pub fn label(&self) -> String {
        if self.is_pre_week() {
            format!("{} Pre-Week", self.year)
        } else {
            format!("{} W{:02}", self.year, self.week)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Monday-anchored week numbering.
///
/// `include_pre_week` decides whether dates before the first Monday land in
/// week 0 or are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekBucketer {
    pub include_pre_week: bool,
}

impl WeekBucketer {
    pub fn new(include_pre_week: bool) -> Self {
        Self { include_pre_week }
    }

    pub fn week_of(&self, date: NaiveDate) -> Option<WeekId> {
        let year = date.year();
        let first = first_monday(year)?;
        if date < first {
            return self.include_pre_week.then_some(WeekId { year, week: 0 });
        }
        let week = (date - first).num_days() / 7 + 1;
        Some(WeekId {
            year,
            week: week as u32,
        })
    }

    /// Date span of a week. `None` for week 0 when pre-week buckets are
    /// disabled or the year starts on a Monday, and for weeks past the end of
    /// the year. The last week is cut at Dec 31: later days belong to the
    /// next year's buckets.
    pub fn range_of(&self, id: WeekId) -> Option<WeekRange> {
        let first = first_monday(id.year)?;
        if id.week == 0 {
            if !self.include_pre_week {
                return None;
            }
            let start = NaiveDate::from_ymd_opt(id.year, 1, 1)?;
            let end = first.pred_opt()?;
            return (start <= end).then_some(WeekRange { start, end });
        }
        let start = first + Duration::days(7 * (i64::from(id.week) - 1));
        if start.year() != id.year {
            return None;
        }
        let year_end = NaiveDate::from_ymd_opt(id.year, 12, 31)?;
        Some(WeekRange {
            start,
            end: (start + Duration::days(6)).min(year_end),
        })
    }
}

/// First Monday on or after January 1 of `year`.
pub fn first_monday(year: i32) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = jan1.weekday().num_days_from_sunday() as i64;
    let advance = match jan1.weekday() {
        Weekday::Mon => 0,
        Weekday::Sun => 1,
        _ => 8 - offset,
    };
    Some(jan1 + Duration::days(advance))
}
