//! Timestamps at the precision the stores persist (microseconds).

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Current time truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A stamp strictly newer than `previous`, normally the current time.
pub fn after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// `[start, end)` of the UTC calendar day containing `at`.
pub fn utc_day_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = at
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(at);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_after_is_strictly_newer_even_for_future_stamps() {
        let future = now() + Duration::hours(1);
        assert!(after(future) > future);
        let past = now() - Duration::hours(1);
        assert!(after(past) > past);
    }

    #[test]
    fn test_day_bounds() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 59).unwrap();
        let (start, end) = utc_day_bounds(at);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap());
    }
}
