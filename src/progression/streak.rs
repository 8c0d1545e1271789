//! Daily streak bookkeeping, calendar-day granularity.
use chrono::NaiveDate;
use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    pub last_streak_date: Option<NaiveDate>,
}

/// Streak after a passed completion on `today`.
pub fn advance_streak(
    streak: u32,
    last_streak_date: Option<NaiveDate>,
    today: NaiveDate,
) -> StreakUpdate {
    let Some(last) = last_streak_date else {
        return StreakUpdate {
            streak: 1,
            last_streak_date: Some(today),
        };
    };

    let diff_days = (today - last).num_days();
    match diff_days {
        0 => StreakUpdate {
            streak,
            last_streak_date,
        },
        1 => StreakUpdate {
            streak: streak.saturating_add(1),
            last_streak_date: Some(today),
        },
        d if d > 1 => StreakUpdate {
            streak: 1,
            last_streak_date: Some(today),
        },
        d => {
            warn!(
                "last streak date {} is {} day(s) after today {}, leaving streak at {}",
                last, -d, today, streak
            );
            StreakUpdate {
                streak,
                last_streak_date,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_first_streak() {
        let update = advance_streak(0, None, date(10));
        assert_eq!(update.streak, 1);
        assert_eq!(update.last_streak_date, Some(date(10)));
    }

    #[test]
    fn test_same_day_unchanged() {
        let update = advance_streak(4, Some(date(10)), date(10));
        assert_eq!(update.streak, 4);
        assert_eq!(update.last_streak_date, Some(date(10)));
    }

    #[test]
    fn test_consecutive_day() {
        let update = advance_streak(5, Some(date(9)), date(10));
        assert_eq!(update.streak, 6);
        assert_eq!(update.last_streak_date, Some(date(10)));
    }

    #[test]
    fn test_streak_saturates() {
        assert_eq!(advance_streak(u32::MAX, Some(date(9)), date(10)).streak, u32::MAX);
    }

    #[test]
    fn test_gap_resets() {
        let update = advance_streak(5, Some(date(7)), date(10));
        assert_eq!(update.streak, 1);
        assert_eq!(update.last_streak_date, Some(date(10)));
    }

    #[test]
    fn test_month_boundary() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(advance_streak(2, Some(last), today).streak, 3);
    }

    #[test]
    fn test_clock_skew_is_noop() {
        let update = advance_streak(3, Some(date(12)), date(10));
        assert_eq!(update.streak, 3);
        assert_eq!(update.last_streak_date, Some(date(12)));
    }
}
