// File: ./src/model/calculator.rs
use crate::model::rule::{Frequency, Interval, MonthDay, RecurrenceRule, WeekdaySet};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

pub struct NextOccurrenceCalculator;

impl NextOccurrenceCalculator {
    /// Calculates the date the rule produces after `from`, the date of the most recently
    /// completed occurrence. Returns None if the rule has already ended as of `from` or
    /// if the candidate would land on or after the rule's end date.
    pub fn compute_next(rule: &RecurrenceRule, from: NaiveDate) -> Option<NaiveDate> {
        let end_date = rule.termination.end_date;

        if let Some(end) = end_date
            && from >= end
        {
            log::debug!("Rule ended on {}; nothing after {}", end, from);
            return None;
        }

        let candidate = match rule.frequency {
            Frequency::Daily { interval } => add_days(from, u64::from(interval.get())),
            Frequency::Weekly {
                interval,
                week_days: None,
            } => add_days(from, 7 * u64::from(interval.get())),
            Frequency::Weekly {
                interval,
                week_days: Some(days),
            } => next_listed_weekday(from, interval, days),
            Frequency::Monthly {
                interval,
                month_day,
            } => add_months_clamped(from, interval.get(), month_day),
            Frequency::Yearly { interval } => interval
                .get()
                .checked_mul(12)
                .and_then(|months| add_months_clamped(from, months, None)),
        };

        let Some(next) = candidate else {
            log::warn!(
                "Next {} occurrence after {} is out of the supported date range",
                rule.frequency.kind(),
                from
            );
            return None;
        };

        if let Some(end) = end_date
            && next >= end
        {
            log::debug!("Candidate {} falls on or after end date {}", next, end);
            return None;
        }

        Some(next)
    }

    /// Same as [`Self::compute_next`] on the UTC date of `at`, keeping its time of day.
    pub fn compute_next_at(rule: &RecurrenceRule, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Self::compute_next(rule, at.date_naive()).map(|d| d.and_time(at.time()).and_utc())
    }
}

fn add_days(from: NaiveDate, days: u64) -> Option<NaiveDate> {
    from.checked_add_days(Days::new(days))
}

/// Weekly rule with explicit weekdays. A later weekday in the same week wins; otherwise
/// wrap to the first listed weekday and skip `interval - 1` further weeks. Today's
/// weekday is never re-selected.
fn next_listed_weekday(from: NaiveDate, interval: Interval, days: WeekdaySet) -> Option<NaiveDate> {
    let current = from.weekday().num_days_from_sunday();

    let offset = match days.indices().find(|&day| day > current) {
        Some(day) => u64::from(day - current),
        None => {
            let wrap = u64::from(7 - current + days.first_index());
            wrap + 7 * u64::from(interval.get() - 1)
        }
    };

    add_days(from, offset)
}

/// Shifts by whole months, then lands on `month_day` (or `from`'s own day) clamped to the
/// length of the target month.
fn add_months_clamped(from: NaiveDate, months: u32, month_day: Option<MonthDay>) -> Option<NaiveDate> {
    let target = month_day.map_or(from.day(), |d| u32::from(d.get()));
    let shifted = from.checked_add_months(Months::new(months))?;
    let day = target.min(days_in_month(shifted.year(), shifted.month()));
    shifted.with_day(day)
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2023, 1), 31);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn month_shift_clamps_to_short_month() {
        let jan31 = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert_eq!(
            add_months_clamped(jan31, 1, None),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
        assert_eq!(
            add_months_clamped(jan31, 3, None),
            NaiveDate::from_ymd_opt(2023, 4, 30)
        );
    }

    #[test]
    fn month_shift_uses_explicit_day() {
        let jan31 = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert_eq!(
            add_months_clamped(jan31, 1, MonthDay::new(15)),
            NaiveDate::from_ymd_opt(2023, 2, 15)
        );
    }

    #[test]
    fn overflow_is_none() {
        assert_eq!(add_days(NaiveDate::MAX, 1), None);
    }
}
