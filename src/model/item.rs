// File: ./src/model/item.rs
use crate::model::calculator::NextOccurrenceCalculator;
use crate::model::gate::OccurrenceGate;
use crate::model::rule::RecurrenceRule;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

fn default_occurrence() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    NeedsAction,
    InProcess,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

// --- DATE TYPES ---

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DateType {
    AllDay(NaiveDate),
    Specific(DateTime<Utc>),
}

impl DateType {
    /// Calendar date used for recurrence arithmetic (UTC for specific times).
    pub fn to_date_naive(&self) -> NaiveDate {
        match self {
            DateType::AllDay(d) => *d,
            DateType::Specific(dt) => dt.date_naive(),
        }
    }

    /// Advances by one step of `rule`, keeping the AllDay/Specific flavor.
    pub fn advance(&self, rule: &RecurrenceRule) -> Option<DateType> {
        match self {
            DateType::AllDay(d) => {
                NextOccurrenceCalculator::compute_next(rule, *d).map(DateType::AllDay)
            }
            DateType::Specific(dt) => {
                NextOccurrenceCalculator::compute_next_at(rule, *dt).map(DateType::Specific)
            }
        }
    }

    pub fn format_short(&self) -> String {
        match self {
            DateType::AllDay(d) => d.format("%Y-%m-%d").to_string(),
            DateType::Specific(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

impl PartialOrd for DateType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateType {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.to_date_naive().cmp(&other.to_date_naive()) {
            Ordering::Equal => match (self, other) {
                // Same day: a specific time sorts before an all-day entry
                (DateType::Specific(t1), DateType::Specific(t2)) => t1.cmp(t2),
                (DateType::Specific(_), DateType::AllDay(_)) => Ordering::Less,
                (DateType::AllDay(_), DateType::Specific(_)) => Ordering::Greater,
                (DateType::AllDay(_), DateType::AllDay(_)) => Ordering::Equal,
            },
            ord => ord,
        }
    }
}

// --- TASK ---

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub uid: String,
    pub summary: String,
    pub status: TaskStatus,
    pub due: Option<DateType>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// 1-based position of this task in its series.
    #[serde(default = "default_occurrence")]
    pub occurrence: u32,
    /// UID of the occurrence whose completion created this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawned_from: Option<String>,
}

impl Task {
    pub fn new(summary: &str) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            summary: summary.trim().to_string(),
            status: TaskStatus::NeedsAction,
            due: None,
            recurrence: None,
            occurrence: 1,
            spawned_from: None,
        }
    }

    pub fn with_due(mut self, due: DateType) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Builds the next occurrence of this task, or None if it has no rule, no due date,
    /// or the series is over as of `today`.
    ///
    /// The successor gets a fresh UID, the same rule, and a back-reference to this task
    /// so the caller can detect a completion that was already handled.
    pub fn next_occurrence(&self, today: NaiveDate) -> Option<Task> {
        let rule = self.recurrence.as_ref()?;
        let due = self.due.as_ref()?;

        if !OccurrenceGate::should_continue_on(rule, self.occurrence, today) {
            return None;
        }

        let next_due = due.advance(rule)?;

        Some(Task {
            uid: Uuid::new_v4().to_string(),
            summary: self.summary.clone(),
            status: TaskStatus::NeedsAction,
            due: Some(next_due),
            recurrence: Some(*rule),
            occurrence: self.occurrence.saturating_add(1),
            spawned_from: Some(self.uid.clone()),
        })
    }

    pub fn checkbox_symbol(&self) -> &'static str {
        match self.status {
            TaskStatus::Completed => "[x]",
            TaskStatus::Cancelled => "[-]",
            TaskStatus::InProcess => "[>]",
            TaskStatus::NeedsAction => "[ ]",
        }
    }

    /// Open tasks first, then by due date (undated last), then by summary.
    pub fn compare_for_listing(&self, other: &Self) -> Ordering {
        self.status
            .is_done()
            .cmp(&other.status.is_done())
            .then_with(|| match (&self.due, &other.due) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.summary.cmp(&other.summary))
    }
}
