//! Recurrence rules for the scheduler primitive (C11): daily/weekly/monthly
//! cadences interpreted in the schedule's IANA timezone, advancing a UTC
//! `fireAt`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonthlyConstraint {
    NextWeekend,
    NextWeekday,
    NextSaturday,
    NextSunday,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    Daily { interval: u32 },
    Weekly { interval: u32, days_of_week: Vec<Weekday> },
    Monthly { interval: u32, day_of_month: Option<u32>, anchor_day: Option<u32>, constraint: Option<MonthlyConstraint> },
}

/// Shifts a naive local time forward to the next time that actually
/// exists in `tz` — handles a spring-forward DST gap by walking minutes
/// forward until `tz` accepts the local time unambiguously.
fn resolve_local(tz: Tz, naive: chrono::NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => {
            let mut candidate = naive;
            loop {
                candidate += Duration::minutes(1);
                if let chrono::LocalResult::Single(dt) = tz.from_local_datetime(&candidate) {
                    return dt;
                }
            }
        }
    }
}

fn next_matching_weekday_on_or_after(year: i32, month: u32, start_day: u32, days: &[Weekday]) -> Option<NaiveDate> {
    let days_in_month = days_in_month(year, month);
    (start_day..=days_in_month).find_map(|d| {
        let date = NaiveDate::from_ymd_opt(year, month, d)?;
        days.contains(&date.weekday()).then_some(date)
    })
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap().pred_opt().unwrap().day()
}

impl Recurrence {
    /// Computes the next `fireAt` (UTC) strictly after `from` (also UTC),
    /// preserving `from`'s local time-of-day in `tz`.
    pub fn next_fire_after(&self, from: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
        let local = from.with_timezone(&tz);
        let time_of_day = local.time();

        match self {
            Recurrence::Daily { interval } => {
                let next_date = local.date_naive() + Duration::days((*interval).max(1) as i64);
                resolve_local(tz, next_date.and_time(time_of_day)).with_timezone(&Utc)
            }
            Recurrence::Weekly { interval, days_of_week } => {
                let days = if days_of_week.is_empty() { vec![local.weekday()] } else { days_of_week.clone() };
                let mut cursor = local.date_naive() + Duration::days(1);
                loop {
                    if days.contains(&cursor.weekday()) {
                        // honor the week interval by counting week boundaries from `from`'s week start
                        let weeks_elapsed = (cursor - local.date_naive()).num_days() / 7;
                        if weeks_elapsed % (*interval).max(1) as i64 == 0 {
                            return resolve_local(tz, cursor.and_time(time_of_day)).with_timezone(&Utc);
                        }
                    }
                    cursor += Duration::days(1);
                }
            }
            Recurrence::Monthly { interval, day_of_month, anchor_day, constraint } => {
                let mut year = local.year();
                let mut month = local.month();
                let advance = |y: &mut i32, m: &mut u32, step: u32| {
                    let total = (*m - 1) as i64 + step as i64;
                    *y += (total / 12) as i32;
                    *m = (total % 12) as u32 + 1;
                };
                advance(&mut year, &mut month, (*interval).max(1));

                let date = if let Some(dom) = day_of_month {
                    let clamped = (*dom).min(days_in_month(year, month));
                    NaiveDate::from_ymd_opt(year, month, clamped).unwrap()
                } else {
                    let anchor = anchor_day.unwrap_or(1).min(days_in_month(year, month));
                    match constraint {
                        Some(MonthlyConstraint::NextWeekend) => {
                            next_matching_weekday_on_or_after(year, month, anchor, &[Weekday::Sat, Weekday::Sun]).unwrap()
                        }
                        Some(MonthlyConstraint::NextWeekday) => {
                            next_matching_weekday_on_or_after(year, month, anchor, &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]).unwrap()
                        }
                        Some(MonthlyConstraint::NextSaturday) => {
                            next_matching_weekday_on_or_after(year, month, anchor, &[Weekday::Sat]).unwrap()
                        }
                        Some(MonthlyConstraint::NextSunday) => {
                            next_matching_weekday_on_or_after(year, month, anchor, &[Weekday::Sun]).unwrap()
                        }
                        None => NaiveDate::from_ymd_opt(year, month, anchor).unwrap(),
                    }
                };
                resolve_local(tz, date.and_time(time_of_day)).with_timezone(&Utc)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn daily_advances_by_interval() {
        let tz: Tz = "UTC".parse().unwrap();
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let rec = Recurrence::Daily { interval: 2 };
        let next = rec.next_fire_after(from, tz);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap());
    }

    #[test]
    fn weekly_picks_next_matching_day_of_week() {
        let tz: Tz = "UTC".parse().unwrap();
        // 2026-01-01 is a Thursday.
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let rec = Recurrence::Weekly { interval: 1, days_of_week: vec![Weekday::Mon] };
        let next = rec.next_fire_after(from, tz);
        assert_eq!(next.weekday(), Weekday::Mon);
        assert!(next > from);
    }

    #[test]
    fn monthly_day_of_month_clamps_short_months() {
        let tz: Tz = "UTC".parse().unwrap();
        let from = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
        let rec = Recurrence::Monthly { interval: 1, day_of_month: Some(31), anchor_day: None, constraint: None };
        let next = rec.next_fire_after(from, tz);
        // February 2026 has 28 days.
        assert_eq!(next.day(), 28);
        assert_eq!(next.month(), 2);
    }

    #[test]
    fn monthly_next_weekend_from_anchor() {
        let tz: Tz = "UTC".parse().unwrap();
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let rec = Recurrence::Monthly { interval: 1, day_of_month: None, anchor_day: Some(1), constraint: Some(MonthlyConstraint::NextWeekend) };
        let next = rec.next_fire_after(from, tz);
        assert!(matches!(next.weekday(), Weekday::Sat | Weekday::Sun));
        assert_eq!(next.month(), 2);
    }

    #[test]
    fn dst_gap_shifts_to_next_valid_local_time() {
        // US Eastern: 2026-03-08 02:00 local does not exist (spring forward).
        let tz: Tz = "America/New_York".parse().unwrap();
        let from = Utc.with_ymd_and_hms(2026, 3, 7, 7, 0, 0).unwrap(); // 2026-03-07 02:00 local
        let rec = Recurrence::Daily { interval: 1 };
        let next = rec.next_fire_after(from, tz);
        // Should resolve to a real instant, not panic, and land on/after the gap.
        assert!(next > from);
    }
}
