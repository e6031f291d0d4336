// File: src/controller.rs
//! Task workflows shared by every front end.
//! Each mutation re-reads local storage, applies the change and writes it back while
//! holding both the store mutex and the on-disk lock, so the read-decide-insert
//! sequence of a completion is a single step even with other processes writing.
use crate::context::AppContext;
use crate::model::Task;
use crate::storage::LocalStorage;
use crate::store::{CompletionOutcome, TaskStore};
use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct TaskController {
    pub store: Arc<Mutex<TaskStore>>,
    pub ctx: Arc<dyn AppContext>,
}

impl TaskController {
    pub fn new(store: Arc<Mutex<TaskStore>>, ctx: Arc<dyn AppContext>) -> Self {
        Self { store, ctx }
    }

    /// Builds a controller over whatever is currently in local storage.
    pub fn load(ctx: Arc<dyn AppContext>) -> Result<Self> {
        let tasks = LocalStorage::load(ctx.as_ref())?;
        log::debug!("Loaded {} task(s) from local storage", tasks.len());
        Ok(Self::new(
            Arc::new(Mutex::new(TaskStore::from_tasks(tasks))),
            ctx,
        ))
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, TaskStore>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("Task store lock poisoned"))
    }

    /// Runs `op` against the latest stored tasks and persists the result. The in-memory
    /// store is replaced only if `op` and the write both succeed.
    fn transact<T>(&self, op: impl FnOnce(&mut TaskStore) -> Result<T>) -> Result<T> {
        let mut store = self.lock_store()?;
        LocalStorage::modify(self.ctx.as_ref(), |tasks| {
            let mut fresh = TaskStore::from_tasks(std::mem::take(tasks));
            let out = op(&mut fresh)?;
            *tasks = fresh.sorted();
            Ok((out, fresh))
        })
        .map(|(out, fresh)| {
            *store = fresh;
            out
        })
    }

    pub fn create_task(&self, task: Task) -> Result<String> {
        let uid = task.uid.clone();
        self.transact(|store| {
            store.add_task(task);
            Ok(())
        })?;
        Ok(uid)
    }

    pub fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.lock_store()?.sorted())
    }

    /// Completes `uid` as of today's local date.
    pub fn complete(&self, uid: &str) -> Result<CompletionOutcome> {
        self.complete_on(uid, Local::now().date_naive())
    }

    /// Completes `uid`; for a recurring task this also creates the next occurrence.
    /// A repeated call for the same UID creates nothing further.
    pub fn complete_on(&self, uid: &str, today: NaiveDate) -> Result<CompletionOutcome> {
        self.transact(|store| {
            store
                .complete(uid, today)
                .ok_or_else(|| anyhow!("No task with UID {}", uid))
        })
    }
}
