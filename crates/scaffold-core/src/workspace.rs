use crate::actions::WorkspaceAction;
use crate::config::Config;
use crate::error::StoreError;
use crate::persistence::PersistedWorkspace;
use crate::persistence::StateStore;
use crate::reducer::reduce;
use crate::reducer::WorkspaceEffect;
use crate::state::WorkspaceState;

/// State container binding a `WorkspaceState` to a storage medium.
#[derive(Debug)]
pub struct Workspace<S: StateStore> {
    state: WorkspaceState,
    store: S,
}

impl<S: StateStore> Workspace<S> {
    pub fn open(config: &Config, store: S) -> Result<Self, StoreError> {
        let mut state = WorkspaceState::new(config);
        if let Some(snapshot) = store.load()? {
            tracing::debug!(steps = snapshot.steps.len(), "restored workspace snapshot");
            snapshot.restore_into(&mut state);
        }
        Ok(Self { state, store })
    }

    /// Runs `action` through the reducer and saves a snapshot when persisted
    /// fields changed. Returns the remaining effects for the caller.
    pub fn dispatch(&mut self, action: WorkspaceAction) -> Result<Vec<WorkspaceEffect>, StoreError> {
        let mut effects = reduce(&mut self.state, action);
        if effects.contains(&WorkspaceEffect::Persist) {
            self.store.save(&PersistedWorkspace::capture(&self.state))?;
            effects.retain(|effect| *effect != WorkspaceEffect::Persist);
        }
        Ok(effects)
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actions::RuntimeAction;
    use crate::actions::UserAction;
    use crate::persistence::JsonFileStore;
    use crate::persistence::MemoryStore;
    use crate::step::StepStatus;

    const LOG: &str = r#"<agentAction type="file" filePath="src/main.ts">console.log(1)</agentAction>
<agentAction type="shell">npm run dev</agentAction>"#;

    #[test]
    fn dispatch_saves_after_persisted_changes() {
        let mut workspace = Workspace::open(&Config::default(), MemoryStore::default()).expect("open");
        let effects = workspace
            .dispatch(WorkspaceAction::Runtime(RuntimeAction::SetChatResponse(
                LOG.to_string(),
            )))
            .expect("dispatch");

        assert!(matches!(
            effects.as_slice(),
            [WorkspaceEffect::Mount(_)]
        ));
        assert_eq!(workspace.store().saves(), 1);
        let saved = workspace.store().snapshot().expect("snapshot");
        assert_eq!(saved.steps.len(), 2);
        assert!(saved
            .steps
            .iter()
            .all(|step| step.status == StepStatus::Completed));
    }

    #[test]
    fn view_only_actions_do_not_save() {
        let mut workspace = Workspace::open(&Config::default(), MemoryStore::default()).expect("open");
        workspace
            .dispatch(WorkspaceAction::Runtime(RuntimeAction::SetChatResponse(
                LOG.to_string(),
            )))
            .expect("ingest");
        workspace
            .dispatch(WorkspaceAction::User(UserAction::ToggleFolder {
                path: "/src".to_string(),
            }))
            .expect("toggle");
        assert_eq!(workspace.store().saves(), 1);
    }

    #[test]
    fn open_restores_snapshot_without_saving() {
        let snapshot = PersistedWorkspace {
            version: crate::persistence::WORKSPACE_SNAPSHOT_VERSION,
            saved_at_ms: 0,
            prompt: "portfolio".to_string(),
            template: None,
            chat_response: Some(LOG.to_string()),
            steps: Vec::new(),
        };
        let workspace =
            Workspace::open(&Config::default(), MemoryStore::with_snapshot(snapshot)).expect("open");
        assert_eq!(workspace.state().prompt, "portfolio");
        assert_eq!(workspace.state().chat_response.as_deref(), Some(LOG));
        assert_eq!(workspace.store().saves(), 0);
    }

    #[test]
    fn reopening_restores_steps_from_disk() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join(".scaffold/workspace.json");
        {
            let store = JsonFileStore::open(&path).expect("store");
            let mut workspace = Workspace::open(&Config::default(), store).expect("open");
            workspace
                .dispatch(WorkspaceAction::User(UserAction::SetPrompt(
                    "landing page".to_string(),
                )))
                .expect("prompt");
            workspace
                .dispatch(WorkspaceAction::Runtime(RuntimeAction::SetChatResponse(
                    LOG.to_string(),
                )))
                .expect("ingest");
        }

        let store = JsonFileStore::open(&path).expect("store");
        let workspace = Workspace::open(&Config::default(), store).expect("reopen");
        assert_eq!(workspace.state().prompt, "landing page");
        assert_eq!(workspace.state().steps.len(), 2);
        assert_eq!(workspace.state().completed_count(), 2);
        assert!(workspace.state().files.is_empty());
    }
}
