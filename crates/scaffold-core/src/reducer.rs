use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::actions::WorkspaceAction;
use super::mount::project;
use super::mount::MountTree;
use super::parser::Parser;
use super::state::LogEntry;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::WorkspaceState;
use super::tree::apply_steps;
use super::tree::mark_batch_applied;
use super::tree::update_file_content;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEffect {
    Mount(MountTree),
    Persist,
}

pub fn reduce(state: &mut WorkspaceState, action: WorkspaceAction) -> Vec<WorkspaceEffect> {
    match action {
        WorkspaceAction::User(user) => reduce_user(state, user),
        WorkspaceAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut WorkspaceState, action: UserAction) -> Vec<WorkspaceEffect> {
    match action {
        UserAction::SetPrompt(prompt) => {
            state.prompt = prompt;
            vec![WorkspaceEffect::Persist]
        }
        UserAction::ToggleStep { id } => {
            let Some(step) = state.steps.iter_mut().find(|step| step.id == id) else {
                return Vec::new();
            };
            step.status = step.status.toggled();
            vec![WorkspaceEffect::Persist]
        }
        UserAction::SelectFile { path } => {
            state.selection.select_file(&state.files, &path);
            Vec::new()
        }
        UserAction::ToggleFolder { path } => {
            state.selection.toggle_folder(&state.files, &path);
            Vec::new()
        }
        UserAction::EditSelectedFile { content } => {
            let Some(path) = state.selection.selected_path.clone() else {
                return Vec::new();
            };
            edit_file(state, &path, &content)
        }
        UserAction::EditFile { path, content } => edit_file(state, &path, &content),
    }
}

fn reduce_runtime(state: &mut WorkspaceState, action: RuntimeAction) -> Vec<WorkspaceEffect> {
    match action {
        RuntimeAction::SetTemplateResponse(response) => {
            let log = response.ui_prompts.first().cloned();
            state.template = Some(response);
            let mut effects = vec![WorkspaceEffect::Persist];
            if let Some(raw) = log {
                ingest(state, &raw, &mut effects);
            }
            effects
        }
        RuntimeAction::ResetTemplateResponse => {
            state.template = None;
            vec![WorkspaceEffect::Persist]
        }
        RuntimeAction::SetChatResponse(response) => {
            state.chat_response = Some(response.clone());
            let mut effects = vec![WorkspaceEffect::Persist];
            ingest(state, &response, &mut effects);
            effects
        }
        RuntimeAction::ResetChatResponse => {
            state.chat_response = None;
            vec![WorkspaceEffect::Persist]
        }
        RuntimeAction::ReplaceSteps(steps) => {
            state.steps = steps;
            let mut effects = vec![WorkspaceEffect::Persist];
            if state.pipeline.auto_apply {
                apply_pending(state, &mut effects);
            }
            effects
        }
        RuntimeAction::ResetSteps => {
            state.steps.clear();
            vec![WorkspaceEffect::Persist]
        }
        RuntimeAction::ApplyPendingSteps => {
            let mut effects = Vec::new();
            apply_pending(state, &mut effects);
            effects
        }
        RuntimeAction::ServerReady { port, url } => {
            state.log(
                LogLevel::Info,
                LogSource::Sandbox,
                format!("server ready on port {port}: {url}"),
            );
            state.preview.port = Some(port);
            state.preview.url = Some(url);
            Vec::new()
        }
        RuntimeAction::AppendLog(message) => {
            state.log(LogLevel::Info, LogSource::Sandbox, message);
            Vec::new()
        }
        RuntimeAction::ClearLogs => {
            state.logs.clear();
            Vec::new()
        }
    }
}

fn ingest(state: &mut WorkspaceState, raw: &str, effects: &mut Vec<WorkspaceEffect>) {
    let parser = Parser::new(state.pipeline.limits);
    let outcome = match parser.parse(raw) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!("failed to parse action log: {err}");
            state.log(LogLevel::Error, LogSource::Parser, err.to_string());
            return;
        }
    };

    for diagnostic in &outcome.diagnostics {
        state
            .logs
            .append(LogEntry::from_diagnostic(LogSource::Parser, diagnostic));
    }
    state.log(
        LogLevel::Info,
        LogSource::Parser,
        format!("parsed {} steps", outcome.steps.len()),
    );
    state.steps = outcome.steps;
    push_effect(effects, WorkspaceEffect::Persist);

    if state.pipeline.auto_apply {
        apply_pending(state, effects);
    }
}

fn apply_pending(state: &mut WorkspaceState, effects: &mut Vec<WorkspaceEffect>) {
    if state.pending_count() == 0 {
        return;
    }

    let update = match apply_steps(&state.files, &state.steps) {
        Ok(update) => update,
        Err(err) => {
            tracing::error!("refusing to apply steps: {err}");
            state.log(LogLevel::Error, LogSource::Tree, err.to_string());
            return;
        }
    };

    for diagnostic in &update.diagnostics {
        state
            .logs
            .append(LogEntry::from_diagnostic(LogSource::Tree, diagnostic));
    }

    let tree_changed = !update.applied.is_empty();
    state.files = update.tree;
    let completed = mark_batch_applied(
        &mut state.steps,
        &update.applied,
        state.pipeline.completion_policy,
    );
    tracing::debug!(
        applied = update.applied.len(),
        completed,
        "applied pending steps"
    );

    if tree_changed {
        commit_tree(state, effects);
    }
    push_effect(effects, WorkspaceEffect::Persist);
}

fn edit_file(state: &mut WorkspaceState, path: &str, content: &str) -> Vec<WorkspaceEffect> {
    if !update_file_content(&mut state.files, path, content) {
        return Vec::new();
    }
    state.log(LogLevel::Debug, LogSource::User, format!("edited {path}"));
    let mut effects = Vec::new();
    commit_tree(state, &mut effects);
    effects
}

fn commit_tree(state: &mut WorkspaceState, effects: &mut Vec<WorkspaceEffect>) {
    state.tree_revision += 1;
    state.selection.reconcile(&state.files);
    effects.retain(|effect| !matches!(effect, WorkspaceEffect::Mount(_)));
    effects.push(WorkspaceEffect::Mount(project(&state.files)));
}

fn push_effect(effects: &mut Vec<WorkspaceEffect>, effect: WorkspaceEffect) {
    if !effects.contains(&effect) {
        effects.push(effect);
    }
}

#[cfg(test)]
mod tests;
