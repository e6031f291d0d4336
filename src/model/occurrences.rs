// File: ./src/model/occurrences.rs
use crate::model::calculator::NextOccurrenceCalculator;
use crate::model::gate::OccurrenceGate;
use crate::model::rule::RecurrenceRule;
use chrono::NaiveDate;
use std::iter::FusedIterator;

/// Walks a rule forward from a starting occurrence.
///
/// The start date counts as the first occurrence, so a rule capped at three occurrences
/// yields two dates. Only the occurrence cap and the end date are honoured; the clock is
/// never read, which keeps previews reproducible.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    cursor: NaiveDate,
    generated: u32,
    finished: bool,
}

impl Occurrences {
    pub fn new(rule: RecurrenceRule, start: NaiveDate) -> Self {
        Self {
            rule,
            cursor: start,
            generated: 1,
            finished: false,
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.finished || !OccurrenceGate::within_count(&self.rule, self.generated) {
            self.finished = true;
            return None;
        }

        match NextOccurrenceCalculator::compute_next(&self.rule, self.cursor) {
            Some(next) => {
                self.cursor = next;
                self.generated = self.generated.saturating_add(1);
                Some(next)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl FusedIterator for Occurrences {}
