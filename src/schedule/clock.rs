//! Reporting-timezone clock helpers
//!
//! Every timestamp the prober reports (sheet names, the `Update` column,
//! database rows) is rendered at one fixed UTC offset.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Builds a fixed offset from whole hours, falling back to UTC when out of range
pub fn fixed_offset(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// The current time at the given offset
pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Renders `YYYY-MM-DDTHH:mm:ss+HH:MM`
///
/// # Example
///
/// ```
/// use chrono::TimeZone;
/// use reach_probe::schedule::{fixed_offset, iso_timestamp};
///
/// let at = fixed_offset(7).with_ymd_and_hms(2024, 1, 15, 9, 30, 5).unwrap();
/// assert_eq!(iso_timestamp(&at), "2024-01-15T09:30:05+07:00");
/// ```
pub fn iso_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Names an output sheet `HH:mm_MM/DD/YYYY`
pub fn sheet_name(at: &DateTime<FixedOffset>) -> String {
    at.format("%H:%M_%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_offset() {
        assert_eq!(fixed_offset(7).local_minus_utc(), 7 * 3600);
        assert_eq!(fixed_offset(-5).local_minus_utc(), -5 * 3600);
        assert_eq!(fixed_offset(99).local_minus_utc(), 0);
    }

    #[test]
    fn test_sheet_name() {
        let at = fixed_offset(7).with_ymd_and_hms(2024, 3, 5, 6, 0, 59).unwrap();
        assert_eq!(sheet_name(&at), "06:00_03/05/2024");
    }

    #[test]
    fn test_utc_instant_rendered_at_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 12, 31, 20, 15, 0).unwrap();
        let local = utc.with_timezone(&fixed_offset(7));

        assert_eq!(iso_timestamp(&local), "2025-01-01T03:15:00+07:00");
        assert_eq!(sheet_name(&local), "03:15_01/01/2025");
    }
}
