// File: ./src/context.rs
/*! Filesystem context for the application.

`AppContext` decides where data, config and cache live. Code that touches the
filesystem takes a `&dyn AppContext` (or `Arc<dyn AppContext>`) instead of reading
globals, so tests can point everything at a throwaway directory.

- `StandardContext`: OS locations from `directories::ProjectDirs`, or an explicit
  override root (`--root`).
- `TestContext`: a unique temporary directory removed on drop.
*/

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub trait AppContext: Send + Sync + std::fmt::Debug {
    fn get_data_dir(&self) -> Result<PathBuf>;
    fn get_config_dir(&self) -> Result<PathBuf>;
    fn get_cache_dir(&self) -> Result<PathBuf>;

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_config_dir()?.join("config.toml"))
    }

    fn get_tasks_path(&self) -> Result<PathBuf> {
        Ok(self.get_data_dir()?.join("tasks.json"))
    }

    fn get_log_path(&self) -> Result<PathBuf> {
        Ok(self.get_cache_dir()?.join("tasktide.log"))
    }
}

fn ensure_exists(path: PathBuf) -> Result<PathBuf> {
    if !path.exists() {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create directory: {:?}", path))?;
    }
    Ok(path)
}

// --- Production Implementation ---

#[derive(Clone, Debug)]
pub struct StandardContext {
    override_root: Option<PathBuf>,
}

impl StandardContext {
    /// With `Some(root)`, everything lives under `root/{data,config,cache}`.
    pub fn new(override_root: Option<PathBuf>) -> Self {
        Self { override_root }
    }

    fn get_proj_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "tasktide", "tasktide")
            .ok_or_else(|| anyhow::anyhow!("No home directory"))
    }

    fn resolve(&self, subdir: &str) -> Result<PathBuf> {
        if let Some(root) = &self.override_root {
            return ensure_exists(root.join(subdir));
        }
        let proj = Self::get_proj_dirs()?;
        let dir = match subdir {
            "data" => proj.data_dir(),
            "config" => proj.config_dir(),
            _ => proj.cache_dir(),
        };
        ensure_exists(dir.to_path_buf())
    }
}

impl AppContext for StandardContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        self.resolve("data")
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        self.resolve("config")
    }

    fn get_cache_dir(&self) -> Result<PathBuf> {
        self.resolve("cache")
    }
}

// --- Test Implementation ---

#[derive(Clone, Debug)]
pub struct TestContext {
    pub root: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("tasktide_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("failed to create TestContext temp dir");
        Self { root }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext for TestContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        ensure_exists(self.root.join("data"))
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        ensure_exists(self.root.join("config"))
    }

    fn get_cache_dir(&self) -> Result<PathBuf> {
        ensure_exists(self.root.join("cache"))
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        // Best-effort cleanup
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
