// File: src/store.rs
use crate::model::{Task, TaskStatus};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Result of marking an occurrence complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Task completed; it carries no recurrence (or no due date to advance from).
    Completed,
    /// Task completed and its series has no further occurrence.
    SeriesEnded,
    /// Task completed and the next occurrence was created with this UID.
    Spawned(String),
    /// This completion was already processed; nothing was created.
    AlreadyHandled,
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    pub tasks: HashMap<String, Task>,
    /// Source occurrence UID -> successor UID. At most one successor per source.
    spawned: HashMap<String, String>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        for task in tasks {
            store.add_task(task);
        }
        store
    }

    pub fn add_task(&mut self, task: Task) {
        if let Some(source) = &task.spawned_from {
            self.spawned.insert(source.clone(), task.uid.clone());
        }
        self.tasks.insert(task.uid.clone(), task);
    }

    pub fn get_task(&self, uid: &str) -> Option<&Task> {
        self.tasks.get(uid)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn delete_task(&mut self, uid: &str) -> Option<Task> {
        let task = self.tasks.remove(uid)?;
        if let Some(source) = &task.spawned_from {
            self.spawned.remove(source);
        }
        Some(task)
    }

    /// The task created by completing `uid`, if any.
    pub fn successor_of(&self, uid: &str) -> Option<&Task> {
        self.spawned.get(uid).and_then(|s| self.tasks.get(s))
    }

    /// Tasks in listing order.
    pub fn sorted(&self) -> Vec<Task> {
        let mut list: Vec<Task> = self.tasks.values().cloned().collect();
        list.sort_by(|a, b| a.compare_for_listing(b));
        list
    }

    /// Marks `uid` completed and, for a recurring task, creates its next occurrence.
    ///
    /// Completing the same occurrence again is a no-op, so a retried request never
    /// produces a second successor. Returns None if the UID is unknown.
    pub fn complete(&mut self, uid: &str, today: NaiveDate) -> Option<CompletionOutcome> {
        let task = self.tasks.get_mut(uid)?;

        if task.status == TaskStatus::Completed || self.spawned.contains_key(uid) {
            task.status = TaskStatus::Completed;
            return Some(CompletionOutcome::AlreadyHandled);
        }

        task.status = TaskStatus::Completed;

        if !task.is_recurring() || task.due.is_none() {
            return Some(CompletionOutcome::Completed);
        }

        let Some(next) = task.next_occurrence(today) else {
            log::info!("Series of '{}' ended at occurrence {}", task.summary, task.occurrence);
            return Some(CompletionOutcome::SeriesEnded);
        };

        let next_uid = next.uid.clone();
        log::info!(
            "Spawned occurrence {} of '{}' due {}",
            next.occurrence,
            next.summary,
            next.due.map(|d| d.format_short()).unwrap_or_default()
        );
        self.add_task(next);
        Some(CompletionOutcome::Spawned(next_uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rule::interval;
    use crate::model::{DateType, RecurrenceRule};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn delete_successor_frees_the_source_slot() {
        let mut store = TaskStore::new();
        let task = Task::new("Water plants")
            .with_due(DateType::AllDay(date(2024, 3, 1)))
            .with_recurrence(RecurrenceRule::daily(interval(2).unwrap()));
        let uid = task.uid.clone();
        store.add_task(task);

        let Some(CompletionOutcome::Spawned(next_uid)) = store.complete(&uid, date(2024, 3, 1))
        else {
            panic!("expected a successor");
        };
        assert!(store.successor_of(&uid).is_some());

        store.delete_task(&next_uid);
        assert!(store.successor_of(&uid).is_none());
    }
}
