// Manages local file storage for tasks.
//
// Changes to the Task struct or its nested types (DateType, RecurrenceRule) require
// incrementing LOCAL_STORAGE_VERSION below.
use crate::context::AppContext;
use crate::model::Task;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Version history:
// - v0: bare JSON array of tasks
// - v1: versioned wrapper, tasks carry `occurrence` and `spawned_from`
const LOCAL_STORAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct LocalStorageData {
    #[serde(default)]
    version: u32,
    tasks: Vec<Task>,
}

pub struct LocalStorage;

impl LocalStorage {
    /// Sidecar lock file next to `file_path` (`tasks.json` -> `tasks.json.lock`).
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive lock on the sidecar lock file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    pub fn get_path(ctx: &dyn AppContext) -> Result<PathBuf> {
        ctx.get_tasks_path()
    }

    /// Loads all stored tasks. A missing file is an empty list.
    pub fn load(ctx: &dyn AppContext) -> Result<Vec<Task>> {
        let path = Self::get_path(ctx)?;
        if !path.exists() {
            return Ok(vec![]);
        }
        Self::with_lock(&path, || Self::read_unlocked(&path))
    }

    pub fn save(ctx: &dyn AppContext, tasks: &[Task]) -> Result<()> {
        let path = Self::get_path(ctx)?;
        Self::with_lock(&path, || Self::write_current(&path, tasks))
    }

    /// Read, mutate and write back under one lock, so a concurrent writer in another
    /// process cannot slip in between the read and the write. Nothing is written if
    /// `f` fails.
    pub fn modify<F, T>(ctx: &dyn AppContext, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<T>,
    {
        let path = Self::get_path(ctx)?;
        Self::with_lock(&path, || {
            let mut tasks = Self::read_unlocked(&path)?;
            let out = f(&mut tasks)?;
            Self::write_current(&path, &tasks)?;
            Ok(out)
        })
    }

    fn write_current(path: &Path, tasks: &[Task]) -> Result<()> {
        let data = LocalStorageData {
            version: LOCAL_STORAGE_VERSION,
            tasks: tasks.to_vec(),
        };
        let json = serde_json::to_string_pretty(&data)?;
        Self::atomic_write(path, json)
    }

    // Caller must hold the lock; fs2 locks are not reentrant across file handles.
    fn read_unlocked(path: &Path) -> Result<Vec<Task>> {
        if !path.exists() {
            return Ok(vec![]);
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if let Ok(data) = serde_json::from_str::<LocalStorageData>(&json) {
            if data.version > LOCAL_STORAGE_VERSION {
                return Err(anyhow::anyhow!(
                    "{} was written by a newer version (v{}, supported v{})",
                    path.display(),
                    data.version,
                    LOCAL_STORAGE_VERSION
                ));
            }
            return Ok(data.tasks);
        }

        // No wrapper: v0 bare array. Upgrade in place.
        let tasks: Vec<Task> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        log::info!(
            "Migrating {} from v0 to v{}",
            path.display(),
            LOCAL_STORAGE_VERSION
        );
        Self::write_current(path, &tasks)?;
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_appends_extension() {
        assert_eq!(
            LocalStorage::get_lock_path(Path::new("/tmp/tasks.json")),
            PathBuf::from("/tmp/tasks.json.lock")
        );
        assert_eq!(
            LocalStorage::get_lock_path(Path::new("/tmp/tasks")),
            PathBuf::from("/tmp/tasks.lock")
        );
    }
}
