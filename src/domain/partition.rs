use std::fmt;

use chrono::{DateTime, Datelike, Duration};
use chrono_tz::Tz;

/// Months never need more than five week buckets: week 1 absorbs the partial
/// run-in before the first Monday, and anything past the start of the fifth
/// Mon-Sun block is clamped into bucket 5.
pub const WEEKS_PER_MONTH: u8 = 5;

/// Which week bucket of its calendar month a timestamp falls into.
///
/// Week 1 runs from the 1st through the first Sunday (1-7 days long
/// depending on which weekday the month starts). Every later week is a full
/// Monday-Sunday block, capped at 5.
pub fn week_index_in_month(ts: DateTime<Tz>) -> u8 {
    let day = ts.date_naive();
    let first = day.with_day(1).unwrap();

    // Days from the 1st to the first Sunday of the month.
    let to_first_sunday = 6 - first.weekday().num_days_from_monday();
    let week1_end = first + Duration::days(to_first_sunday as i64);
    if day <= week1_end {
        return 1;
    }

    // week1_end is a Sunday, so the day after is the first full-week Monday.
    let first_monday = week1_end + Duration::days(1);
    let idx = 2 + (day - first_monday).num_days() / 7;
    idx.min(WEEKS_PER_MONTH as i64) as u8
}

/// Month discriminator used for partition directories, e.g. "2026_01".
pub fn month_key(ts: DateTime<Tz>) -> String {
    ts.format("%Y_%m").to_string()
}

/// Storage partition key: one CSV file per (year, month, week bucket).
/// Derived from a record's own timestamp, so the same instant always lands
/// in the same file no matter when or where the key is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
    pub week: u8,
}

impl PartitionKey {
    pub fn new(year: i32, month: u32, week: u8) -> Self {
        Self { year, month, week }
    }

    pub fn for_timestamp(ts: DateTime<Tz>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
            week: week_index_in_month(ts),
        }
    }

    /// Directory component, e.g. "2026_01".
    pub fn month_dir(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }

    /// File component, e.g. "wk_3.csv".
    pub fn file_name(&self) -> String {
        format!("wk_{}.csv", self.week)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/wk_{}", self.month_dir(), self.week)
    }
}
