//! Task store — JSON file persistence shared by every host process.
//!
//! Each mutation takes an exclusive advisory lock on `<path>.lock`, re-reads the
//! file, applies one change and rewrites it via temp file + rename. Readers take
//! a shared lock.

use carbonaware_core::error::{CarbonAwareError, Result};
use chrono::{DateTime, FixedOffset, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::tasks::{Task, TaskStatus};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Held for the duration of one read or read-modify-write.
struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self { path: path.to_path_buf(), tasks: vec![] };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn lock(&self, exclusive: bool) -> Result<StoreLock> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(StoreLock(file))
    }

    fn read_disk(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
            CarbonAwareError::store(format!("corrupt task store {}: {e}", self.path.display()))
        })?;
        Ok(file.tasks)
    }

    fn write_disk(&self, tasks: &[Task]) -> Result<()> {
        let file = StoreFile { tasks: tasks.to_vec() };
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&file)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Re-read from disk, discarding in-memory state.
    pub fn reload(&mut self) -> Result<()> {
        let _lock = self.lock(false)?;
        self.tasks = self.read_disk()?;
        tracing::debug!("Loaded {} task(s) from {}", self.tasks.len(), self.path.display());
        Ok(())
    }

    /// Locked read-modify-write. Nothing is written when `change` fails.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Vec<Task>) -> Result<T>) -> Result<T> {
        let _lock = self.lock(true)?;
        let mut tasks = self.read_disk()?;
        match change(&mut tasks) {
            Ok(out) => {
                self.write_disk(&tasks)?;
                self.tasks = tasks;
                Ok(out)
            }
            Err(e) => {
                self.tasks = self.read_disk()?;
                Err(e)
            }
        }
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, task: Task) -> Result<()> {
        self.mutate(|tasks| {
            match tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task,
                None => tasks.push(task),
            }
            Ok(())
        })
    }

    /// Apply `change` to the current on-disk version of task `id`.
    pub fn update(&mut self, id: &str, change: impl FnOnce(&mut Task) -> Result<()>) -> Result<Task> {
        self.mutate(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| CarbonAwareError::TaskNotFound(id.into()))?;
            change(task)?;
            Ok(task.clone())
        })
    }

    /// Move a due task from `Deferred` to `Resuming`. `None` if it is no longer
    /// deferred or due, e.g. because another host claimed or cancelled it.
    pub fn claim(&mut self, id: &str, now: DateTime<Utc>) -> Result<Option<Task>> {
        self.mutate(|tasks| {
            let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
                return Ok(None);
            };
            if !task.is_due(now) {
                return Ok(None);
            }
            task.set_status(TaskStatus::Resuming, now)?;
            Ok(Some(task.clone()))
        })
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Result<Task> {
        self.mutate(|tasks| {
            let idx = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| CarbonAwareError::TaskNotFound(id.into()))?;
            Ok(tasks.remove(idx))
        })
    }

    /// Drop every completed, failed or cancelled task. Returns what was removed.
    pub fn prune(&mut self) -> Result<Vec<Task>> {
        self.mutate(|tasks| {
            let (finished, live): (Vec<Task>, Vec<Task>) =
                tasks.drain(..).partition(|t| t.status.is_terminal());
            *tasks = live;
            Ok(finished)
        })
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Ids of deferred tasks whose wake time has passed, earliest first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut due: Vec<&Task> = self.tasks.iter().filter(|t| t.is_due(now)).collect();
        due.sort_by_key(|t| t.wake_at());
        due.into_iter().map(|t| t.id.clone()).collect()
    }

    /// Earliest wake time among deferred tasks.
    pub fn next_wake(&self) -> Option<DateTime<FixedOffset>> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Deferred)
            .filter_map(Task::wake_at)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonaware_core::config::OperatorConfig;
    use carbonaware_core::types::SuspendRequest;
    use chrono::Duration;

    fn deferred(now: DateTime<Utc>, minutes: i64) -> Task {
        let mut task = Task::new(OperatorConfig::new("t", 60, 30, None).unwrap(), now);
        task.suspend = Some(SuspendRequest::until((now + Duration::minutes(minutes)).fixed_offset()));
        task.set_status(TaskStatus::Deferred, now).unwrap();
        task
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(&dir.path().join("tasks.json")).unwrap();
        assert!(store.list().is_empty());
        assert!(store.next_wake().is_none());
    }

    #[test]
    fn test_upsert_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("tasks.json");
        let now = Utc::now();
        let task = deferred(now, 30);
        let id = task.id.clone();

        let mut store = TaskStore::open(&path).unwrap();
        store.upsert(task.clone()).unwrap();

        let reopened = TaskStore::open(&path).unwrap();
        assert_eq!(reopened.get(&id), Some(&task));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TaskStore::open(&dir.path().join("tasks.json")).unwrap();
        let now = Utc::now();
        let mut task = deferred(now, 30);
        store.upsert(task.clone()).unwrap();

        task.set_status(TaskStatus::Cancelled, now).unwrap();
        store.upsert(task.clone()).unwrap();

        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(&task.id).unwrap().status, TaskStatus::Cancelled);
    }

    #[test]
    fn test_stale_handle_does_not_drop_other_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let now = Utc::now();

        let mut first = TaskStore::open(&path).unwrap();
        let mut second = TaskStore::open(&path).unwrap();
        let x = deferred(now, 30);
        let y = deferred(now, 30);
        second.upsert(x.clone()).unwrap();
        first.upsert(y.clone()).unwrap();

        let reopened = TaskStore::open(&path).unwrap();
        assert!(reopened.get(&x.id).is_some());
        assert!(reopened.get(&y.id).is_some());
    }

    #[test]
    fn test_claim_is_compare_and_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let now = Utc::now();
        let task = deferred(now, 10);

        let mut first = TaskStore::open(&path).unwrap();
        let mut second = TaskStore::open(&path).unwrap();
        first.upsert(task.clone()).unwrap();
        second.reload().unwrap();

        assert!(first.claim(&task.id, now).unwrap().is_none());

        let later = now + Duration::minutes(10);
        let claimed = first.claim(&task.id, later).unwrap().unwrap();
        assert_eq!(claimed.status, TaskStatus::Resuming);
        assert!(second.claim(&task.id, later).unwrap().is_none());
        assert!(second.claim("missing", later).unwrap().is_none());
    }

    #[test]
    fn test_update_sees_latest_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let now = Utc::now();
        let task = deferred(now, 10);

        let mut first = TaskStore::open(&path).unwrap();
        let mut second = TaskStore::open(&path).unwrap();
        first.upsert(task.clone()).unwrap();
        first.claim(&task.id, now + Duration::minutes(10)).unwrap();

        let err = second
            .update(&task.id, |t| t.set_status(TaskStatus::Cancelled, now))
            .unwrap_err();
        assert!(matches!(err, CarbonAwareError::InvalidTransition(_)));
        assert_eq!(TaskStore::open(&path).unwrap().get(&task.id).unwrap().status, TaskStatus::Resuming);
    }

    #[test]
    fn test_due_ordering_and_next_wake() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TaskStore::open(&dir.path().join("tasks.json")).unwrap();
        let now = Utc::now();
        let later = deferred(now, 20);
        let sooner = deferred(now, 10);
        let far = deferred(now, 90);
        store.upsert(later.clone()).unwrap();
        store.upsert(sooner.clone()).unwrap();
        store.upsert(far.clone()).unwrap();

        assert!(store.due(now).is_empty());
        assert_eq!(store.due(now + Duration::minutes(30)), vec![sooner.id.clone(), later.id.clone()]);
        assert_eq!(store.next_wake(), sooner.wake_at());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TaskStore::open(&dir.path().join("tasks.json")).unwrap();
        let task = deferred(Utc::now(), 5);
        store.upsert(task.clone()).unwrap();

        assert_eq!(store.remove(&task.id).unwrap().id, task.id);
        assert!(matches!(store.remove(&task.id), Err(CarbonAwareError::TaskNotFound(_))));
    }

    #[test]
    fn test_prune_keeps_only_live_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = TaskStore::open(&path).unwrap();
        let now = Utc::now();
        let live = deferred(now, 30);
        let mut cancelled = deferred(now, 30);
        cancelled.set_status(TaskStatus::Cancelled, now).unwrap();
        let mut completed = Task::new(OperatorConfig::new("t", 60, 30, None).unwrap(), now);
        completed.set_status(TaskStatus::Completed, now).unwrap();
        store.upsert(live.clone()).unwrap();
        store.upsert(cancelled.clone()).unwrap();
        store.upsert(completed.clone()).unwrap();

        let pruned = store.prune().unwrap();
        assert_eq!(pruned.len(), 2);
        let reopened = TaskStore::open(&path).unwrap();
        assert_eq!(reopened.list(), &[live]);
    }

    #[test]
    fn test_corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(TaskStore::open(&path), Err(CarbonAwareError::Store(_))));
    }
}
