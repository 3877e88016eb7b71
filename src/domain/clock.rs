use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// All day/week/month boundaries in the system are defined in Indian
/// Standard Time, regardless of where the process runs.
pub const IST: Tz = chrono_tz::Asia::Kolkata;

/// Current time in the canonical zone.
pub fn now_ist() -> DateTime<Tz> {
    Utc::now().with_timezone(&IST)
}

/// Build an IST timestamp from a civil date and wall-clock time.
/// IST has no DST transitions in the modern era, so the local time is
/// always unambiguous.
pub fn ist(date: NaiveDate, hour: u32, min: u32, sec: u32) -> DateTime<Tz> {
    IST.from_local_datetime(&date.and_hms_opt(hour, min, sec).unwrap())
        .single()
        .unwrap()
}
