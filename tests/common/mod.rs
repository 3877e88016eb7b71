// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use kharcha::application::ExpenseService;
use kharcha::domain::clock::IST;
use tempfile::TempDir;

/// Helper to create a test service over a temporary data directory
pub fn test_service() -> Result<(ExpenseService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = ExpenseService::open(temp_dir.path().join("data"));
    Ok((service, temp_dir))
}

/// Helper to parse "YYYY-MM-DD HH:MM:SS" (or a bare date, taken at
/// midnight) into an IST timestamp
pub fn parse_ist(s: &str) -> DateTime<Tz> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap_or_else(|_| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    });
    IST.from_local_datetime(&naive).single().unwrap()
}

/// Test fixture: a user with a small spread of expenses
pub struct SampleLedger;

impl SampleLedger {
    /// Two food entries and one travel entry in mid January 2026 (all land
    /// in the third week bucket)
    pub fn record_mid_january(service: &ExpenseService, user: &str) -> Result<()> {
        service.record_expense(user, 10000, "food", None, parse_ist("2026-01-14 09:00:00"))?;
        service.record_expense(user, 5000, "food", None, parse_ist("2026-01-15 13:00:00"))?;
        service.record_expense(user, 3000, "travel", None, parse_ist("2026-01-16 19:30:00"))?;
        Ok(())
    }
}
