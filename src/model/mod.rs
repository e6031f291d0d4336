// File: ./src/model/mod.rs
pub mod calculator;
pub mod gate;
pub mod item;
pub mod occurrences;
pub mod rule;

pub use calculator::NextOccurrenceCalculator;
pub use gate::OccurrenceGate;
pub use item::{DateType, Task, TaskStatus};
pub use occurrences::Occurrences;
pub use rule::{
    Frequency, FrequencyKind, Interval, MonthDay, RecurrenceRule, RuleError, RuleRecord,
    Termination, WeekdaySet,
};
