// ── Version gate and persisted version state ──
//
// The only state that outlives a pass: the client request id sent to the
// endpoint service and the last version token acted upon. Stored as two
// lines of text.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreError;

/// Version recorded before any pass has run.
pub const SENTINEL_VERSION: &str = "0000000000";

/// Persisted `(client request id, last version)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionState {
    pub client_request_id: String,
    pub last_version: String,
}

impl VersionState {
    /// Fresh state with a random client request id and the sentinel version.
    pub fn fresh() -> Self {
        Self {
            client_request_id: Uuid::new_v4().to_string(),
            last_version: SENTINEL_VERSION.to_owned(),
        }
    }

    fn to_text(&self) -> String {
        format!("{}\n{}", self.client_request_id, self.last_version)
    }

    fn from_text(text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim);
        let client_request_id = lines.next().filter(|l| !l.is_empty())?.to_owned();
        let last_version = lines.next().filter(|l| !l.is_empty())?.to_owned();
        Some(Self {
            client_request_id,
            last_version,
        })
    }
}

// ── Stores ───────────────────────────────────────────────────────────

/// Persistence for [`VersionState`].
pub trait VersionStore {
    /// Load the stored state, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<VersionState>, CoreError>;

    /// Overwrite the stored state.
    fn save(&self, state: &VersionState) -> Result<(), CoreError>;
}

/// Two-line text file store.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl ToString) -> CoreError {
        CoreError::VersionState {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl VersionStore for FileVersionStore {
    fn load(&self) -> Result<Option<VersionState>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        VersionState::from_text(&text)
            .map(Some)
            .ok_or_else(|| self.error("expected client request id and version on two lines"))
    }

    fn save(&self, state: &VersionState) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        fs::write(&self.path, state.to_text()).map_err(|e| self.error(e))?;
        debug!(path = %self.path.display(), version = %state.last_version, "version state written");
        Ok(())
    }
}

/// In-process store, shareable between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersionStore {
    state: Arc<Mutex<Option<VersionState>>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `state`.
    pub fn with_state(state: VersionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// Current contents.
    pub fn snapshot(&self) -> Option<VersionState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }
}

impl VersionStore for MemoryVersionStore {
    fn load(&self) -> Result<Option<VersionState>, CoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &VersionState) -> Result<(), CoreError> {
        let mut guard = self.state.lock().map_err(|_| CoreError::VersionState {
            path: "<memory>".into(),
            reason: "lock poisoned".into(),
        })?;
        *guard = Some(state.clone());
        Ok(())
    }
}

// ── Gate ─────────────────────────────────────────────────────────────

/// Decides whether a remote version warrants a pass, and records it.
#[derive(Debug)]
pub struct VersionGate<S> {
    store: S,
    state: VersionState,
}

impl<S: VersionStore> VersionGate<S> {
    /// Load state from `store`, creating and persisting fresh state if absent.
    pub fn open(store: S) -> Result<Self, CoreError> {
        let state = if let Some(state) = store.load()? {
            state
        } else {
            let state = VersionState::fresh();
            info!(client_request_id = %state.client_request_id, "initialising version state");
            store.save(&state)?;
            state
        };
        Ok(Self { store, state })
    }

    pub fn client_request_id(&self) -> &str {
        &self.state.client_request_id
    }

    pub fn last_version(&self) -> &str {
        &self.state.last_version
    }

    pub fn state(&self) -> &VersionState {
        &self.state
    }

    /// `true` iff `remote_version` sorts after the last recorded version.
    ///
    /// Plain string comparison: relies on zero-padded tokens of equal width.
    pub fn should_reconcile(&self, remote_version: &str) -> bool {
        remote_version > self.state.last_version.as_str()
    }

    /// Record `new_version` as the last version acted upon.
    pub fn commit(&mut self, new_version: &str) -> Result<(), CoreError> {
        let next = VersionState {
            client_request_id: self.state.client_request_id.clone(),
            last_version: new_version.to_owned(),
        };
        self.store.save(&next)?;
        info!(from = %self.state.last_version, to = new_version, "version committed");
        self.state = next;
        Ok(())
    }
}
