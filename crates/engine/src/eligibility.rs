//! Birthday eligibility evaluation.
//!
//! Pure predicate over a user record and an instant: is a birthday
//! notification due right now? The scan runs far more often than once per
//! eligible hour, so the year-gate on `last_notified` is what keeps delivery
//! at one message per user per local calendar year.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use herald_common::error::AppError;
use herald_common::types::User;

/// Local hour during which a birthday notification may be sent.
pub const NOTIFICATION_HOUR: u32 = 9;

/// Check whether `user` is due a birthday notification at `now_utc`.
///
/// Projects `now_utc` into the user's zone. Due iff the local hour is 9,
/// the local month/day match the birth date, and no notification has been
/// stamped in the current local year.
///
/// An unresolvable timezone identifier is an error for this user only;
/// callers skip the user and keep scanning.
pub fn is_due_now(user: &User, now_utc: DateTime<Utc>) -> Result<bool, AppError> {
    let tz: Tz = user
        .timezone
        .parse()
        .map_err(|_| AppError::Timezone(user.timezone.clone()))?;
    let local = now_utc.with_timezone(&tz);

    if local.hour() != NOTIFICATION_HOUR {
        return Ok(false);
    }

    if local.month() != user.birthday.month() || local.day() != user.birthday.day() {
        return Ok(false);
    }

    Ok(match user.last_notified {
        None => true,
        Some(sent) => sent.with_timezone(&tz).year() < local.year(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn make_user(birthday: &str, timezone: &str, last_notified: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john@example.com".to_string(),
            birthday: NaiveDate::parse_from_str(birthday, "%Y-%m-%d").unwrap(),
            timezone: timezone.to_string(),
            last_notified,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 15, 0).unwrap()
    }

    #[test]
    fn test_due_at_nine_local_utc() {
        let user = make_user("1990-01-12", "UTC", None);
        assert!(is_due_now(&user, utc(2026, 1, 12, 9)).unwrap());
    }

    #[test]
    fn test_not_due_outside_eligible_hour() {
        let user = make_user("1990-01-12", "UTC", None);
        assert!(!is_due_now(&user, utc(2026, 1, 12, 8)).unwrap());
        assert!(!is_due_now(&user, utc(2026, 1, 12, 10)).unwrap());
    }

    #[test]
    fn test_not_due_on_other_days() {
        let user = make_user("1990-01-12", "UTC", None);
        assert!(!is_due_now(&user, utc(2026, 1, 13, 9)).unwrap());
        assert!(!is_due_now(&user, utc(2026, 2, 12, 9)).unwrap());
    }

    #[test]
    fn test_due_in_utc_plus_seven_at_two_utc() {
        // Asia/Jakarta is UTC+7: local 09:00 on Jan 12 is 02:00 UTC.
        let user = make_user("1990-01-12", "Asia/Jakarta", None);
        assert!(is_due_now(&user, utc(2026, 1, 12, 2)).unwrap());
        assert!(!is_due_now(&user, utc(2026, 1, 12, 9)).unwrap());
    }

    #[test]
    fn test_minute_within_hour_is_unconstrained() {
        let user = make_user("1990-01-12", "UTC", None);
        let late_in_hour = Utc.with_ymd_and_hms(2026, 1, 12, 9, 59, 59).unwrap();
        assert!(is_due_now(&user, late_in_hour).unwrap());
    }

    #[test]
    fn test_already_notified_this_year_blocks() {
        let sent = utc(2026, 1, 12, 9);
        let user = make_user("1990-01-12", "UTC", Some(sent));
        assert!(!is_due_now(&user, utc(2026, 1, 12, 9)).unwrap());
    }

    #[test]
    fn test_notified_last_year_admits() {
        let sent = utc(2025, 1, 12, 9);
        let user = make_user("1990-01-12", "UTC", Some(sent));
        assert!(is_due_now(&user, utc(2026, 1, 12, 9)).unwrap());
    }

    #[test]
    fn test_last_notified_year_compared_in_local_zone() {
        // Honolulu is UTC-10. A stamp at 2026-01-01 05:00 UTC is still
        // 2025-12-31 19:00 locally, so for the year gate it is last year's
        // message even though its UTC year says otherwise.
        let sent = Utc.with_ymd_and_hms(2026, 1, 1, 5, 0, 0).unwrap();
        let user = make_user("1990-01-01", "Pacific/Honolulu", Some(sent));
        // Local 2026-01-01 09:30 == 19:30 UTC
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 19, 30, 0).unwrap();
        assert!(is_due_now(&user, now).unwrap());
    }

    #[test]
    fn test_unresolvable_timezone_is_error() {
        let user = make_user("1990-01-12", "Not/AZone", None);
        let result = is_due_now(&user, utc(2026, 1, 12, 9));
        assert!(matches!(result, Err(AppError::Timezone(_))));
    }

    #[test]
    fn test_feb_29_matches_only_in_leap_years() {
        let user = make_user("1992-02-29", "UTC", None);
        assert!(is_due_now(&user, utc(2028, 2, 29, 9)).unwrap());
        assert!(!is_due_now(&user, utc(2026, 2, 28, 9)).unwrap());
        assert!(!is_due_now(&user, utc(2026, 3, 1, 9)).unwrap());
    }
}
