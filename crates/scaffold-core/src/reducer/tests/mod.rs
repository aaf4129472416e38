pub(super) use super::reduce;
pub(super) use super::WorkspaceEffect;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::actions::WorkspaceAction;
pub(super) use crate::config::Config;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::LogSource;
pub(super) use crate::state::TemplateResponse;
pub(super) use crate::state::WorkspaceState;
pub(super) use crate::step::Step;
pub(super) use crate::step::StepKind;
pub(super) use crate::step::StepStatus;
pub(super) use crate::tree::find_file;
pub(super) use crate::tree::CompletionPolicy;
pub(super) use crate::tree::FileNode;

mod ingestion;
mod logging;
mod user_edits;

const STARTER_LOG: &str = r#"Here is your project.
<agentAction type="file" filePath="package.json">{"name": "app"}</agentAction>
<agentAction type="shell">npm install react</agentAction>
<agentAction type="file" filePath="src/App.tsx">export const App = () =&gt; null;</agentAction>
<agentAction type="shell">npm run dev</agentAction>"#;

fn state() -> WorkspaceState {
    WorkspaceState::new(&Config::default())
}

fn manual_state() -> WorkspaceState {
    let mut config = Config::default();
    config.pipeline.auto_apply = false;
    WorkspaceState::new(&config)
}

fn run_user(state: &mut WorkspaceState, action: UserAction) -> Vec<WorkspaceEffect> {
    reduce(state, WorkspaceAction::User(action))
}

fn run_runtime(state: &mut WorkspaceState, action: RuntimeAction) -> Vec<WorkspaceEffect> {
    reduce(state, WorkspaceAction::Runtime(action))
}

fn file_step(id: u64, path: &str, code: &str) -> Step {
    Step {
        id,
        title: format!("Create \"{path}\""),
        description: format!("Create file at {path}"),
        kind: StepKind::CreateFile,
        status: StepStatus::Pending,
        code: Some(code.to_string()),
        path: Some(path.to_string()),
    }
}

fn shell_step(id: u64, command: &str) -> Step {
    Step {
        id,
        title: format!("Execute {command}"),
        description: format!("Execute: {command}"),
        kind: StepKind::RunScript,
        status: StepStatus::Pending,
        code: Some(command.to_string()),
        path: None,
    }
}

fn has_mount(effects: &[WorkspaceEffect]) -> bool {
    effects
        .iter()
        .any(|effect| matches!(effect, WorkspaceEffect::Mount(_)))
}

fn statuses(state: &WorkspaceState) -> Vec<StepStatus> {
    state.steps.iter().map(|step| step.status).collect()
}
