use chrono::{DateTime, Datelike, Duration, TimeZone};

use super::entities::Recurrence;

/// Decides whether a completed recurring task is due to become active again.
///
/// Daily tasks reset once the calendar flips to a later day, weekly tasks
/// after a full seven days have elapsed, and monthly tasks once a later
/// calendar month begins. Calendar comparisons happen in the timezone of the
/// timestamps handed in.
pub fn should_reset<Tz: TimeZone>(
    recurrence: Recurrence,
    completed_at: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> bool {
    match recurrence {
        Recurrence::Daily => now.date_naive() > completed_at.date_naive(),
        Recurrence::Weekly => now.clone() - completed_at.clone() >= Duration::days(7),
        Recurrence::Monthly => {
            (now.year(), now.month()) > (completed_at.year(), completed_at.month())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::tasks::entities::Recurrence;

    use super::should_reset;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_daily_resets_on_next_calendar_day() {
        let completed = at(2026, 3, 2, 23, 50);
        assert!(!should_reset(
            Recurrence::Daily,
            &completed,
            &at(2026, 3, 2, 23, 59)
        ));
        // Ten minutes later, but the calendar day changed.
        assert!(should_reset(
            Recurrence::Daily,
            &completed,
            &at(2026, 3, 3, 0, 1)
        ));
    }

    #[test]
    fn test_weekly_resets_after_seven_full_days() {
        let completed = at(2026, 3, 2, 12, 0);
        assert!(!should_reset(
            Recurrence::Weekly,
            &completed,
            &at(2026, 3, 9, 11, 59)
        ));
        assert!(should_reset(
            Recurrence::Weekly,
            &completed,
            &at(2026, 3, 9, 12, 0)
        ));
    }

    #[test]
    fn test_monthly_resets_when_a_later_month_begins() {
        let completed = at(2026, 1, 31, 12, 0);
        assert!(!should_reset(
            Recurrence::Monthly,
            &completed,
            &at(2026, 1, 31, 23, 59)
        ));
        assert!(should_reset(
            Recurrence::Monthly,
            &completed,
            &at(2026, 2, 1, 0, 1)
        ));
    }

    #[test]
    fn test_monthly_handles_year_rollover() {
        let completed = at(2026, 12, 15, 9, 0);
        assert!(should_reset(
            Recurrence::Monthly,
            &completed,
            &at(2027, 1, 1, 0, 0)
        ));
    }

    #[test]
    fn test_never_resets_at_the_completion_instant() {
        let completed = at(2026, 6, 10, 8, 0);
        for recurrence in [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly] {
            assert!(!should_reset(recurrence, &completed, &completed));
        }
    }
}
