// File: ./src/model/gate.rs
use crate::model::rule::RecurrenceRule;
use chrono::{Local, NaiveDate};

/// Decides whether another occurrence should be materialized at all, independently of
/// which date it would land on.
pub struct OccurrenceGate;

impl OccurrenceGate {
    /// Checks the occurrence cap, then the end date against today's local date.
    pub fn should_continue(rule: &RecurrenceRule, occurrences_so_far: u32) -> bool {
        Self::should_continue_on(rule, occurrences_so_far, Local::now().date_naive())
    }

    /// Same as [`Self::should_continue`] with an explicit "today".
    pub fn should_continue_on(rule: &RecurrenceRule, occurrences_so_far: u32, today: NaiveDate) -> bool {
        if !Self::within_count(rule, occurrences_so_far) {
            log::debug!(
                "Occurrence cap reached ({} generated)",
                occurrences_so_far
            );
            return false;
        }

        if let Some(end) = rule.termination.end_date
            && today >= end
        {
            log::debug!("End date {} reached (today is {})", end, today);
            return false;
        }

        true
    }

    /// The occurrence-count check alone. Does not read the clock.
    pub fn within_count(rule: &RecurrenceRule, occurrences_so_far: u32) -> bool {
        rule.termination
            .end_after_occurrences
            .is_none_or(|max| occurrences_so_far < max)
    }
}
