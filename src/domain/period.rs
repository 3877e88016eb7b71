use chrono::{DateTime, Datelike, Duration, NaiveDate};
use chrono_tz::Tz;

use super::clock::ist;

/// Monday 00:00:00 through Sunday 23:59:59 of the week containing `ts`.
pub fn week_bounds(ts: DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    let day = ts.date_naive();
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    let start = ist(monday, 0, 0, 0);
    let end = ist(monday + Duration::days(6), 23, 59, 59);
    (start, end)
}

/// First instant of the month through its last second: the end is the first
/// instant of the following month, stepped back one second.
pub fn month_bounds(ts: DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    let first = ts.date_naive().with_day(1).unwrap();
    let next_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1).unwrap()
    } else {
        first.with_month(first.month() + 1).unwrap()
    };
    let start = ist(first, 0, 0, 0);
    let end = ist(next_first, 0, 0, 0) - Duration::seconds(1);
    (start, end)
}

/// The reporting windows a summary can be requested for. Bounds are closed
/// on both ends and always computed from a single caller-supplied reference
/// instant, read from the clock once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::Yesterday => "yesterday",
            ReportPeriod::ThisWeek => "this-week",
            ReportPeriod::LastWeek => "last-week",
            ReportPeriod::ThisMonth => "this-month",
            ReportPeriod::LastMonth => "last-month",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "today" => Some(ReportPeriod::Today),
            "yesterday" => Some(ReportPeriod::Yesterday),
            "this-week" => Some(ReportPeriod::ThisWeek),
            "last-week" => Some(ReportPeriod::LastWeek),
            "this-month" => Some(ReportPeriod::ThisMonth),
            "last-month" => Some(ReportPeriod::LastMonth),
            _ => None,
        }
    }

    /// Inclusive [start, end] bounds of this window around `now`.
    pub fn bounds(&self, now: DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
        let today = now.date_naive();
        match self {
            // Midnight up to the reference instant itself.
            ReportPeriod::Today => (ist(today, 0, 0, 0), now),
            ReportPeriod::Yesterday => {
                let y = today - Duration::days(1);
                (ist(y, 0, 0, 0), ist(y, 23, 59, 59))
            }
            ReportPeriod::ThisWeek => week_bounds(now),
            ReportPeriod::LastWeek => week_bounds(now - Duration::days(7)),
            ReportPeriod::ThisMonth => month_bounds(now),
            ReportPeriod::LastMonth => {
                // The day before the 1st pins the previous calendar month.
                let last_of_prev = today.with_day(1).unwrap() - Duration::days(1);
                month_bounds(ist(last_of_prev, 0, 0, 0))
            }
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
