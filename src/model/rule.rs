// File: ./src/model/rule.rs
//! Recurrence rule data model.
//!
//! A rule is a tagged union over the repeat unit so that fields which only make sense
//! for one frequency (weekdays for weekly rules, a day-of-month for monthly rules)
//! cannot be attached to another. The flat record used on the wire is converted
//! through [`RuleRecord`], which is where malformed input gets rejected.
use crate::model::calculator::NextOccurrenceCalculator;
use crate::model::gate::OccurrenceGate;
use crate::model::occurrences::Occurrences;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use strum::{Display, EnumString};
use thiserror::Error;

/// "Every N units". Zero is unrepresentable.
pub type Interval = NonZeroU32;

/// Weekdays ordered by their index in the Sunday-first week (0 = Sunday … 6 = Saturday).
const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("interval must be at least 1")]
    ZeroInterval,
    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
    #[error("weekDays can only be set on weekly rules (got {0})")]
    WeekDaysRequireWeekly(FrequencyKind),
    #[error("monthDay can only be set on monthly rules (got {0})")]
    MonthDayRequiresMonthly(FrequencyKind),
    #[error("monthDay must be between 1 and 31 (got {0})")]
    MonthDayOutOfRange(u8),
}

/// Builds an [`Interval`], rejecting zero.
pub fn interval(n: u32) -> Result<Interval, RuleError> {
    NonZeroU32::new(n).ok_or(RuleError::ZeroInterval)
}

/// The bare repeat unit, without any per-frequency payload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FrequencyKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

// --- WEEKDAYS ---

/// Index of a weekday in the Sunday-first week.
pub fn sunday_index(day: Weekday) -> u32 {
    day.num_days_from_sunday()
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Accepts full names and three-letter abbreviations, case-insensitive.
pub fn parse_weekday(name: &str) -> Result<Weekday, RuleError> {
    let day = match name.trim().to_lowercase().as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return Err(RuleError::UnknownWeekday(name.to_string())),
    };
    Ok(day)
}

/// A non-empty set of weekdays, stored as a bitmask indexed Sunday-first.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// Returns `None` when `days` is empty.
    pub fn new<I: IntoIterator<Item = Weekday>>(days: I) -> Option<Self> {
        let bits = days
            .into_iter()
            .fold(0u8, |acc, day| acc | (1 << sunday_index(day)));
        (bits != 0).then_some(Self(bits))
    }

    pub fn single(day: Weekday) -> Self {
        Self(1 << sunday_index(day))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << sunday_index(day)) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Never true for a set built through `new` or `single`.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Sunday-first indices of the members, ascending.
    pub fn indices(&self) -> impl Iterator<Item = u32> + use<> {
        let bits = self.0;
        (0..7u32).filter(move |&i| bits & (1 << i) != 0)
    }

    /// Smallest Sunday-first index in the set.
    pub fn first_index(&self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Members in Sunday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + use<> {
        self.indices().map(|i| SUNDAY_FIRST[i as usize])
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// --- MONTH DAY ---

/// A day-of-month target in `1..=31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay(u8);

impl MonthDay {
    pub fn new(day: u8) -> Option<Self> {
        (1..=31).contains(&day).then_some(Self(day))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MonthDay {
    type Error = RuleError;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        Self::new(day).ok_or(RuleError::MonthDayOutOfRange(day))
    }
}

// --- RULE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily {
        interval: Interval,
    },
    /// Without `week_days` the rule keeps the weekday of the reference date.
    Weekly {
        interval: Interval,
        week_days: Option<WeekdaySet>,
    },
    /// Without `month_day` the target day is read from the reference date at each step.
    Monthly {
        interval: Interval,
        month_day: Option<MonthDay>,
    },
    Yearly {
        interval: Interval,
    },
}

impl Frequency {
    pub fn kind(&self) -> FrequencyKind {
        match self {
            Frequency::Daily { .. } => FrequencyKind::Daily,
            Frequency::Weekly { .. } => FrequencyKind::Weekly,
            Frequency::Monthly { .. } => FrequencyKind::Monthly,
            Frequency::Yearly { .. } => FrequencyKind::Yearly,
        }
    }

    pub fn interval(&self) -> Interval {
        match *self {
            Frequency::Daily { interval }
            | Frequency::Weekly { interval, .. }
            | Frequency::Monthly { interval, .. }
            | Frequency::Yearly { interval } => interval,
        }
    }
}

/// Independent terminators. If both are set, whichever is reached first wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Termination {
    /// Exclusive: nothing is produced on or after this date.
    pub end_date: Option<NaiveDate>,
    pub end_after_occurrences: Option<u32>,
}

impl Termination {
    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none() && self.end_after_occurrences.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord", into = "RuleRecord")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub termination: Termination,
}

impl RecurrenceRule {
    /// An open-ended rule.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            termination: Termination::default(),
        }
    }

    pub fn daily(interval: Interval) -> Self {
        Self::new(Frequency::Daily { interval })
    }

    pub fn weekly(interval: Interval, week_days: Option<WeekdaySet>) -> Self {
        Self::new(Frequency::Weekly {
            interval,
            week_days,
        })
    }

    pub fn monthly(interval: Interval, month_day: Option<MonthDay>) -> Self {
        Self::new(Frequency::Monthly {
            interval,
            month_day,
        })
    }

    pub fn yearly(interval: Interval) -> Self {
        Self::new(Frequency::Yearly { interval })
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.termination.end_date = Some(end_date);
        self
    }

    pub fn end_after(mut self, occurrences: u32) -> Self {
        self.termination.end_after_occurrences = Some(occurrences);
        self
    }

    /// Next occurrence strictly after `from`, or `None` once the rule is exhausted.
    pub fn next_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        NextOccurrenceCalculator::compute_next(self, from)
    }

    /// Whether another occurrence should be materialized, checked against the clock.
    pub fn should_continue(&self, occurrences_so_far: u32) -> bool {
        OccurrenceGate::should_continue(self, occurrences_so_far)
    }

    /// Upcoming dates after `start`, where `start` itself is occurrence #1.
    pub fn occurrences(&self, start: NaiveDate) -> Occurrences {
        Occurrences::new(*self, start)
    }
}

// --- WIRE FORM ---

/// Flat record as stored alongside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub frequency: FrequencyKind,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_days: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_day: Option<u8>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_after_occurrences: Option<u32>,
}

impl TryFrom<RuleRecord> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let kind = record.frequency;
        let interval = interval(record.interval)?;

        // On a weekly rule an empty list is treated the same as an absent one.
        let week_days = match record.week_days.as_deref() {
            None => None,
            Some(_) if kind != FrequencyKind::Weekly => {
                return Err(RuleError::WeekDaysRequireWeekly(kind));
            }
            Some([]) => None,
            Some(names) => {
                let days = names
                    .iter()
                    .map(|n| parse_weekday(n))
                    .collect::<Result<Vec<_>, _>>()?;
                WeekdaySet::new(days)
            }
        };

        let month_day = match record.month_day {
            None => None,
            Some(_) if kind != FrequencyKind::Monthly => {
                return Err(RuleError::MonthDayRequiresMonthly(kind));
            }
            Some(day) => Some(MonthDay::try_from(day)?),
        };

        let frequency = match kind {
            FrequencyKind::Daily => Frequency::Daily { interval },
            FrequencyKind::Weekly => Frequency::Weekly {
                interval,
                week_days,
            },
            FrequencyKind::Monthly => Frequency::Monthly {
                interval,
                month_day,
            },
            FrequencyKind::Yearly => Frequency::Yearly { interval },
        };

        Ok(Self {
            frequency,
            termination: Termination {
                end_date: record.end_date,
                end_after_occurrences: record.end_after_occurrences,
            },
        })
    }
}

impl From<RecurrenceRule> for RuleRecord {
    fn from(rule: RecurrenceRule) -> Self {
        let (week_days, month_day) = match rule.frequency {
            Frequency::Weekly {
                week_days: Some(days),
                ..
            } => (
                Some(days.iter().map(|d| weekday_name(d).to_string()).collect()),
                None,
            ),
            Frequency::Monthly {
                month_day: Some(day),
                ..
            } => (None, Some(day.get())),
            _ => (None, None),
        };

        Self {
            frequency: rule.frequency.kind(),
            interval: rule.frequency.interval().get(),
            week_days,
            month_day,
            end_date: rule.termination.end_date,
            end_after_occurrences: rule.termination.end_after_occurrences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_set_orders_sunday_first() {
        let set = WeekdaySet::new([Weekday::Sat, Weekday::Mon, Weekday::Sun]).unwrap();
        assert_eq!(set.indices().collect::<Vec<_>>(), vec![0, 1, 6]);
        assert_eq!(set.first_index(), 0);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Weekday::Mon));
        assert!(!set.contains(Weekday::Tue));
    }

    #[test]
    fn weekday_set_rejects_empty() {
        assert!(WeekdaySet::new(std::iter::empty()).is_none());
    }

    #[test]
    fn weekday_set_dedups() {
        let set = WeekdaySet::new([Weekday::Fri, Weekday::Fri]).unwrap();
        assert_eq!(set, WeekdaySet::single(Weekday::Fri));
    }

    #[test]
    fn parse_weekday_accepts_short_and_mixed_case() {
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("SUNDAY").unwrap(), Weekday::Sun);
        assert_eq!(
            parse_weekday("funday"),
            Err(RuleError::UnknownWeekday("funday".to_string()))
        );
    }

    #[test]
    fn month_day_bounds() {
        assert!(MonthDay::new(0).is_none());
        assert!(MonthDay::new(32).is_none());
        assert_eq!(MonthDay::new(31).map(|d| d.get()), Some(31));
    }

    #[test]
    fn frequency_kind_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<FrequencyKind>().unwrap(), FrequencyKind::Weekly);
        assert_eq!(FrequencyKind::Yearly.to_string(), "yearly");
    }
}
