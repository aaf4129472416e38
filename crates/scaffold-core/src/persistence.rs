use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::StoreError;
use crate::state::TemplateResponse;
use crate::state::WorkspaceState;
use crate::step::Step;

pub const WORKSPACE_SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedWorkspace {
    pub version: u16,
    pub saved_at_ms: i64,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub template: Option<TemplateResponse>,
    #[serde(default)]
    pub chat_response: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl PersistedWorkspace {
    pub fn capture(state: &WorkspaceState) -> Self {
        Self {
            version: WORKSPACE_SNAPSHOT_VERSION,
            saved_at_ms: chrono::Utc::now().timestamp_millis(),
            prompt: state.prompt.clone(),
            template: state.template.clone(),
            chat_response: state.chat_response.clone(),
            steps: state.steps.clone(),
        }
    }

    pub fn restore_into(self, state: &mut WorkspaceState) {
        state.prompt = self.prompt;
        state.template = self.template;
        state.chat_response = self.chat_response;
        state.steps = self.steps;
    }
}

pub trait StateStore {
    fn load(&self) -> Result<Option<PersistedWorkspace>, StoreError>;
    fn save(&mut self, snapshot: &PersistedWorkspace) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedWorkspace>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        let snapshot = serde_json::from_slice::<PersistedWorkspace>(&bytes)?;
        if snapshot.version != WORKSPACE_SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: snapshot.version,
                expected: WORKSPACE_SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &PersistedWorkspace) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(snapshot)?;
        write_private(&self.path, &encoded)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<PersistedWorkspace>,
    saves: usize,
}

impl MemoryStore {
    pub fn with_snapshot(snapshot: PersistedWorkspace) -> Self {
        Self {
            snapshot: Some(snapshot),
            saves: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&PersistedWorkspace> {
        self.snapshot.as_ref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedWorkspace>, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &PersistedWorkspace) -> Result<(), StoreError> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}

fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}
