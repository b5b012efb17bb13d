//! Persistence of registered repository records.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use fs2::FileExt;
use tracing::debug;
use uuid::Uuid;

use crate::data::repository::{NewRepository, RepositoryRecord, RepositoryStatus, RepositoryUpdate};
use crate::utils::settings::{get_env_var, Settings};

/// Environment variable overriding the JSON store location.
pub const STORE_PATH_ENV: &str = "COMMIT_SCRUB_STORE";

/// Storage of repository records keyed by id, with unique URLs.
pub trait RepositoryStore: Send + Sync {
    /// Inserts a new record in `pending` state, failing if the URL is already registered.
    fn create(&self, repository: NewRepository) -> Result<RepositoryRecord>;

    /// Returns all records in insertion order.
    fn list(&self) -> Result<Vec<RepositoryRecord>>;

    /// Looks up a record by id.
    fn get(&self, id: &str) -> Result<Option<RepositoryRecord>>;

    /// Looks up a record by canonical URL.
    fn get_by_url(&self, url: &str) -> Result<Option<RepositoryRecord>>;

    /// Applies a partial update and returns the updated record.
    fn update(&self, id: &str, update: RepositoryUpdate) -> Result<RepositoryRecord>;

    /// Moves a record to `to` if its current status is one of `from`.
    ///
    /// The check and the write happen under one lock. Returns `None`, leaving
    /// the record untouched, when the status is not in `from`.
    fn try_transition(
        &self,
        id: &str,
        from: &[RepositoryStatus],
        to: RepositoryStatus,
    ) -> Result<Option<RepositoryRecord>>;

    /// Removes a record, returning whether it existed.
    fn delete(&self, id: &str) -> Result<bool>;
}

fn new_record(repository: NewRepository) -> RepositoryRecord {
    RepositoryRecord {
        id: Uuid::new_v4().to_string(),
        url: repository.url,
        name: repository.name,
        owner: repository.owner,
        private: repository.private,
        default_branch: repository.default_branch,
        status: RepositoryStatus::Pending,
        last_scanned_at: None,
        tool_commits_found: None,
    }
}

fn insert(records: &mut Vec<RepositoryRecord>, repository: NewRepository) -> Result<RepositoryRecord> {
    if records.iter().any(|r| r.url == repository.url) {
        bail!("Repository already registered: {}", repository.url);
    }
    let record = new_record(repository);
    records.push(record.clone());
    Ok(record)
}

fn apply_update(
    records: &mut [RepositoryRecord],
    id: &str,
    update: RepositoryUpdate,
) -> Result<RepositoryRecord> {
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| anyhow!("Repository record not found: {id}"))?;
    update.apply(record);
    Ok(record.clone())
}

fn transition(
    records: &mut [RepositoryRecord],
    id: &str,
    from: &[RepositoryStatus],
    to: RepositoryStatus,
) -> Result<Option<RepositoryRecord>> {
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| anyhow!("Repository record not found: {id}"))?;
    if !from.contains(&record.status) {
        return Ok(None);
    }
    record.status = to;
    Ok(Some(record.clone()))
}

fn remove(records: &mut Vec<RepositoryRecord>, id: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}

fn lock(records: &Mutex<Vec<RepositoryRecord>>) -> Result<MutexGuard<'_, Vec<RepositoryRecord>>> {
    records
        .lock()
        .map_err(|_| anyhow!("Repository store lock poisoned"))
}

/// In-process store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RepositoryRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryStore for MemoryStore {
    fn create(&self, repository: NewRepository) -> Result<RepositoryRecord> {
        insert(&mut *lock(&self.records)?, repository)
    }

    fn list(&self) -> Result<Vec<RepositoryRecord>> {
        Ok(lock(&self.records)?.clone())
    }

    fn get(&self, id: &str) -> Result<Option<RepositoryRecord>> {
        Ok(lock(&self.records)?.iter().find(|r| r.id == id).cloned())
    }

    fn get_by_url(&self, url: &str) -> Result<Option<RepositoryRecord>> {
        Ok(lock(&self.records)?.iter().find(|r| r.url == url).cloned())
    }

    fn update(&self, id: &str, update: RepositoryUpdate) -> Result<RepositoryRecord> {
        apply_update(&mut *lock(&self.records)?, id, update)
    }

    fn try_transition(
        &self,
        id: &str,
        from: &[RepositoryStatus],
        to: RepositoryStatus,
    ) -> Result<Option<RepositoryRecord>> {
        transition(&mut *lock(&self.records)?, id, from, to)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(remove(&mut *lock(&self.records)?, id))
    }
}

/// Store persisted as a JSON array in a single file.
///
/// Every operation reads the file, and every mutation rewrites it in full.
/// Access is serialized across processes by an exclusive lock on a sibling
/// `.lock` file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Held while the store file is read or rewritten; unlocks on drop.
struct StoreLock {
    _file: File,
}

impl JsonFileStore {
    /// Opens a store at `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens the store at `$COMMIT_SCRUB_STORE`, or `repositories.json` next
    /// to the settings file.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Returns the default store location.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = get_env_var(STORE_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let settings_path = Settings::get_settings_path()?;
        let dir = settings_path
            .parent()
            .context("Settings path has no parent directory")?;
        Ok(dir.join("repositories.json"))
    }

    fn read(&self) -> Result<Vec<RepositoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read repository store: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse repository store: {}", self.path.display()))
    }

    fn write(&self, records: &[RepositoryRecord]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(records)
            .context("Failed to serialize repository records")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write repository store: {}", self.path.display()))?;
        debug!(path = %self.path.display(), records = records.len(), "Saved repository store");
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn acquire(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        if let Some(dir) = lock_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock repository store: {}", lock_path.display()))?;
        Ok(StoreLock { _file: file })
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Vec<RepositoryRecord>) -> Result<T>) -> Result<T> {
        let _lock = self.acquire()?;
        let mut records = self.read()?;
        let value = f(&mut records)?;
        self.write(&records)?;
        Ok(value)
    }

    fn snapshot(&self) -> Result<Vec<RepositoryRecord>> {
        let _lock = self.acquire()?;
        self.read()
    }
}

impl RepositoryStore for JsonFileStore {
    fn create(&self, repository: NewRepository) -> Result<RepositoryRecord> {
        self.modify(|records| insert(records, repository))
    }

    fn list(&self) -> Result<Vec<RepositoryRecord>> {
        self.snapshot()
    }

    fn get(&self, id: &str) -> Result<Option<RepositoryRecord>> {
        Ok(self.snapshot()?.into_iter().find(|r| r.id == id))
    }

    fn get_by_url(&self, url: &str) -> Result<Option<RepositoryRecord>> {
        Ok(self.snapshot()?.into_iter().find(|r| r.url == url))
    }

    fn update(&self, id: &str, update: RepositoryUpdate) -> Result<RepositoryRecord> {
        self.modify(|records| apply_update(records, id, update))
    }

    fn try_transition(
        &self,
        id: &str,
        from: &[RepositoryStatus],
        to: RepositoryStatus,
    ) -> Result<Option<RepositoryRecord>> {
        self.modify(|records| transition(records, id, from, to))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.modify(|records| Ok(remove(records, id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn hello() -> NewRepository {
        NewRepository {
            url: "https://github.com/octo/hello".to_string(),
            name: "hello".to_string(),
            owner: "octo".to_string(),
            private: false,
            default_branch: "main".to_string(),
        }
    }

    fn exercise(store: &dyn RepositoryStore) {
        let record = store.create(hello()).unwrap();
        assert_eq!(record.status, RepositoryStatus::Pending);
        assert!(record.tool_commits_found.is_none());

        let err = store.create(hello()).unwrap_err();
        assert!(err.to_string().contains("already registered"));

        let found = store.get_by_url(&record.url).unwrap().unwrap();
        assert_eq!(found.id, record.id);

        let updated = store
            .update(
                &record.id,
                RepositoryUpdate {
                    status: Some(RepositoryStatus::NeedsCleanup),
                    last_scanned_at: Some(Utc::now()),
                    tool_commits_found: Some(4),
                    ..RepositoryUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, RepositoryStatus::NeedsCleanup);
        assert_eq!(updated.tool_commits_found, Some(4));
        assert!(updated.last_scanned_at.is_some());
        assert_eq!(store.get(&record.id).unwrap().unwrap(), updated);

        assert!(store.update("missing", RepositoryUpdate::default()).is_err());

        let idle = [RepositoryStatus::NeedsCleanup, RepositoryStatus::Clean];
        let claimed = store
            .try_transition(&record.id, &idle, RepositoryStatus::Processing)
            .unwrap()
            .unwrap();
        assert_eq!(claimed.status, RepositoryStatus::Processing);
        assert_eq!(claimed.tool_commits_found, Some(4));
        assert!(store
            .try_transition(&record.id, &idle, RepositoryStatus::Processing)
            .unwrap()
            .is_none());
        assert_eq!(
            store.get(&record.id).unwrap().unwrap().status,
            RepositoryStatus::Processing
        );
        assert!(store
            .try_transition("missing", &idle, RepositoryStatus::Processing)
            .is_err());

        assert!(store.delete(&record.id).unwrap());
        assert!(!store.delete(&record.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn memory_store_operations() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn json_store_operations() {
        let dir = TempDir::new().unwrap();
        exercise(&JsonFileStore::new(dir.path().join("repositories.json")));
    }

    #[test]
    fn json_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("repositories.json");

        let created = JsonFileStore::new(&path).create(hello()).unwrap();
        let reopened = JsonFileStore::new(&path);
        let records = reopened.list().unwrap();
        assert_eq!(records, vec![created]);
    }

    #[test]
    fn json_store_claim_is_seen_by_other_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.json");
        let first = JsonFileStore::new(&path);
        let second = JsonFileStore::new(&path);
        let record = first.create(hello()).unwrap();

        let idle = [RepositoryStatus::Pending];
        assert!(first
            .try_transition(&record.id, &idle, RepositoryStatus::Processing)
            .unwrap()
            .is_some());
        assert!(second
            .try_transition(&record.id, &idle, RepositoryStatus::Processing)
            .unwrap()
            .is_none());
        assert!(dir.path().join("repositories.lock").exists());
    }

    #[test]
    fn json_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).list().unwrap_err();
        assert!(err.to_string().contains("Failed to parse repository store"));
    }
}
