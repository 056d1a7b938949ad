//! Persisted distribution state
//!
//! [`StatePersister`] is the narrow commit/read/clear boundary the controller
//! writes through. Two stores implement it: [`MemoryStateStore`] for a single
//! in-process slot, and [`FileStateSlot`], one address inside the
//! `.cdnflow/state.json` file managed by [`StateManager`].

use crate::error::{CloudError, Result};
use crate::id::DistributionId;
use crate::model::DistributionStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".cdnflow";
const STATE_FILE: &str = "state.json";
const STATE_TMP: &str = "state.json.tmp";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";
const STALE_LOCK_AGE: Duration = Duration::from_secs(60 * 60);

/// Durable snapshot of a distribution as known to the controller
///
/// Every field is optional: the anchor commit carries only the identifier
/// and project, the final commit fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionState {
    pub id: Option<String>,
    pub project: Option<String>,
    pub combined_id: Option<String>,
    pub status: Option<DistributionStatus>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub errors: Option<Vec<String>>,
    pub domains: Option<Vec<String>>,
    pub config: Option<ConfigState>,
}

impl DistributionState {
    /// Minimal state committed right after a successful create call
    pub fn anchor(id: &DistributionId) -> Self {
        Self {
            id: Some(id.distribution.clone()),
            project: Some(id.project.clone()),
            combined_id: Some(id.combined()),
            ..Default::default()
        }
    }

    /// Identifier of the tracked distribution, if one has been anchored
    pub fn distribution_id(&self) -> Option<DistributionId> {
        match (&self.project, &self.id) {
            (Some(project), Some(id)) => Some(DistributionId::new(project, id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigState {
    pub backend: Option<BackendState>,
    pub regions: Option<Vec<String>>,
    pub blocked_countries: Option<Vec<String>>,
    pub optimizer: Option<OptimizerState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendState {
    pub backend_type: String,
    pub origin_url: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub geofencing: Option<Vec<GeofencingState>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofencingState {
    pub action: String,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerState {
    pub enabled: bool,
}

/// Boundary between the controller and durable state
///
/// A partial (anchor) commit followed by a full commit must be accepted.
#[async_trait]
pub trait StatePersister: Send + Sync {
    /// Replace the stored state with `state`
    async fn commit(&self, state: &DistributionState) -> Result<()>;

    /// Remove the resource from state entirely
    async fn clear(&self) -> Result<()>;

    /// Current state, `None` when nothing is tracked
    async fn read(&self) -> Result<Option<DistributionState>>;
}

/// In-process single-slot store
///
/// Keeps every committed snapshot so callers can inspect commit order.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    current: Option<DistributionState>,
    history: Vec<DistributionState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with an existing state
    pub fn with_state(state: DistributionState) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                current: Some(state),
                history: Vec::new(),
            }),
        }
    }

    /// Snapshots committed so far, oldest first
    pub fn history(&self) -> Vec<DistributionState> {
        self.inner
            .lock()
            .map(|inner| inner.history.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| CloudError::StateError("memory state store poisoned".to_string()))
    }
}

#[async_trait]
impl StatePersister for MemoryStateStore {
    async fn commit(&self, state: &DistributionState) -> Result<()> {
        let mut inner = self.lock()?;
        inner.current = Some(state.clone());
        inner.history.push(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.current = None;
        Ok(())
    }

    async fn read(&self) -> Result<Option<DistributionState>> {
        Ok(self.lock()?.current.clone())
    }
}

/// Contents of the state file: every managed distribution by address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Distributions indexed by resource address
    pub resources: BTreeMap<String, DistributionState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource
    pub fn set_resource(&mut self, address: String, state: DistributionState) {
        self.resources.insert(address, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, address: &str) -> Option<DistributionState> {
        let result = self.resources.remove(address);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, address: &str) -> Option<&DistributionState> {
        self.resources.get(address)
    }
}

/// Reads and writes the state file under a project root
#[derive(Debug, Clone)]
pub struct StateManager {
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn tmp_path(&self) -> PathBuf {
        self.state_dir().join(STATE_TMP)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state, empty when no state file exists yet
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state
    ///
    /// The new content is written to a temporary file and renamed over the
    /// state file, so a crash never leaves the directory without a state file.
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        if path.exists() {
            fs::copy(&path, self.backup_path()).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Persister for a single resource address
    pub fn slot(&self, address: impl Into<String>) -> FileStateSlot {
        FileStateSlot {
            manager: self.clone(),
            address: address.into(),
        }
    }

    /// Acquire a lock for exclusive access
    ///
    /// The lock file is created with `create_new`, so of two concurrent
    /// callers exactly one wins. An existing lock older than an hour is
    /// treated as abandoned and taken over once.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();
        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&lock_info)?;

        for _ in 0..2 {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
                .await;

            match created {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.sync_all().await?;
                    tracing::debug!("Acquired state lock");
                    return Ok(StateLock {
                        lock_path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    remove_stale_lock(&lock_path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CloudError::LockError(
            "State lock was taken by another process during stale lock takeover".to_string(),
        ))
    }
}

/// Remove the lock at `lock_path` if it is abandoned, fail if it is held
///
/// A lock file is empty for a moment between creation and write, so an
/// unparsable lock only counts as abandoned once the file itself is stale.
async fn remove_stale_lock(lock_path: &Path) -> Result<()> {
    let content = match fs::read_to_string(lock_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str::<LockInfo>(&content) {
        Ok(lock_info) => {
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_seconds() < STALE_LOCK_AGE.as_secs() as i64 {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} (pid {}) since {}",
                    lock_info.holder, lock_info.pid, lock_info.acquired_at
                )));
            }
            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }
        Err(parse_error) => {
            let modified = match fs::metadata(lock_path).await {
                Ok(metadata) => metadata.modified()?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default();
            if age < STALE_LOCK_AGE {
                return Err(CloudError::LockError(format!(
                    "State lock {} is unreadable ({}); remove it if no other cdnflow process is running",
                    lock_path.display(),
                    parse_error
                )));
            }
            tracing::warn!("Removing unreadable stale lock {}", lock_path.display());
        }
    }

    match fs::remove_file(lock_path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// One resource address inside the state file
#[derive(Debug, Clone)]
pub struct FileStateSlot {
    manager: StateManager,
    address: String,
}

impl FileStateSlot {
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl StatePersister for FileStateSlot {
    async fn commit(&self, state: &DistributionState) -> Result<()> {
        let mut global = self.manager.load().await?;
        global.set_resource(self.address.clone(), state.clone());
        self.manager.save(&global).await
    }

    async fn clear(&self) -> Result<()> {
        let mut global = self.manager.load().await?;
        if global.remove_resource(&self.address).is_some() {
            self.manager.save(&global).await?;
        }
        Ok(())
    }

    async fn read(&self) -> Result<Option<DistributionState>> {
        let global = self.manager.load().await?;
        Ok(global.get_resource(&self.address).cloned())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    #[serde(default)]
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the state lock
#[derive(Debug)]
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn full_state() -> DistributionState {
        DistributionState {
            status: Some(DistributionStatus::Active),
            domains: Some(vec!["abc.cdn.example.net".to_string()]),
            ..DistributionState::anchor(&DistributionId::new("proj", "dist-1"))
        }
    }

    #[test]
    fn test_anchor_state_has_only_identifier() {
        let anchor = DistributionState::anchor(&DistributionId::new("proj", "dist-1"));
        assert_eq!(anchor.id.as_deref(), Some("dist-1"));
        assert_eq!(anchor.project.as_deref(), Some("proj"));
        assert_eq!(anchor.combined_id.as_deref(), Some("proj,dist-1"));
        assert!(anchor.status.is_none());
        assert!(anchor.config.is_none());
        assert_eq!(
            anchor.distribution_id(),
            Some(DistributionId::new("proj", "dist-1"))
        );
    }

    #[tokio::test]
    async fn test_memory_store_partial_then_full_commit() {
        let store = MemoryStateStore::new();
        let anchor = DistributionState::anchor(&DistributionId::new("proj", "dist-1"));

        store.commit(&anchor).await.unwrap();
        store.commit(&full_state()).await.unwrap();

        assert_eq!(store.read().await.unwrap(), Some(full_state()));
        assert_eq!(store.history(), vec![anchor, full_state()]);

        store.clear().await.unwrap();
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.set_resource("cdn.main".to_string(), full_state());
        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        assert_eq!(loaded.get_resource("cdn.main"), Some(&full_state()));
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_newer_state_version_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.version = STATE_VERSION + 1;
        manager.save(&state).await.unwrap();

        assert!(matches!(
            manager.load().await,
            Err(CloudError::StateError(_))
        ));
    }

    #[tokio::test]
    async fn test_file_slots_are_independent() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        let main = manager.slot("cdn.main");
        let assets = manager.slot("cdn.assets");

        main.commit(&full_state()).await.unwrap();
        assets
            .commit(&DistributionState::anchor(&DistributionId::new("proj", "dist-2")))
            .await
            .unwrap();

        main.clear().await.unwrap();

        assert!(main.read().await.unwrap().is_none());
        let remaining = assets.read().await.unwrap().unwrap();
        assert_eq!(remaining.id.as_deref(), Some("dist-2"));
        assert!(temp_dir.path().join(".cdnflow/state.json.backup").exists());
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_released() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(
            manager.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = manager.acquire_lock().await.unwrap();
        drop(again);
        assert!(!temp_dir.path().join(".cdnflow/lock.json").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lock_has_one_winner() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        for _ in 0..50 {
            let first = tokio::spawn({
                let manager = manager.clone();
                async move { manager.acquire_lock().await }
            });
            let second = tokio::spawn({
                let manager = manager.clone();
                async move { manager.acquire_lock().await }
            });

            let results = [first.await.unwrap(), second.await.unwrap()];
            let winners = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(winners, 1);
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(CloudError::LockError(_))))
            );

            for lock in results.into_iter().flatten() {
                lock.release().await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_stale_lock_is_taken_over() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        let lock_path = temp_dir.path().join(".cdnflow/lock.json");
        std::fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
        let abandoned = serde_json::json!({
            "holder": "old-host",
            "pid": 1,
            "acquired_at": Utc::now() - chrono::Duration::hours(2),
        });
        std::fs::write(&lock_path, abandoned.to_string()).unwrap();

        let lock = manager.acquire_lock().await.unwrap();

        let content = std::fs::read_to_string(&lock_path).unwrap();
        let info: LockInfo = serde_json::from_str(&content).unwrap();
        assert_eq!(info.pid, std::process::id());
        lock.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_fresh_unreadable_lock_is_respected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        let lock_path = temp_dir.path().join(".cdnflow/lock.json");
        std::fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
        std::fs::write(&lock_path, "").unwrap();

        let err = manager.acquire_lock().await.unwrap_err();

        assert!(matches!(err, CloudError::LockError(ref msg) if msg.contains("unreadable")));
        assert!(lock_path.exists());
    }

    #[tokio::test]
    async fn test_old_unreadable_lock_is_taken_over() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());
        let lock_path = temp_dir.path().join(".cdnflow/lock.json");
        std::fs::create_dir_all(lock_path.parent().unwrap()).unwrap();
        std::fs::write(&lock_path, "{\"holder\": \"trunc").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&lock_path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(2 * 60 * 60))
            .unwrap();

        let lock = manager.acquire_lock().await.unwrap();
        lock.release().await.unwrap();
        assert!(!lock_path.exists());
    }
}
