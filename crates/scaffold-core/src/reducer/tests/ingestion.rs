use super::*;
use pretty_assertions::assert_eq;

#[test]
fn chat_response_replaces_steps_and_builds_tree() {
    let mut state = state();
    let effects = run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );

    let titles: Vec<&str> = state.steps.iter().map(|step| step.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Create \"package.json\"",
            "Install react",
            "Create \"App.tsx\"",
            "Execute npm run",
        ]
    );
    assert_eq!(state.completed_count(), 4);
    assert_eq!(
        find_file(&state.files, "/src/App.tsx").and_then(FileNode::content),
        Some("export const App = () => null;")
    );
    assert_eq!(state.tree_revision, 1);
    assert!(has_mount(&effects));
    assert!(effects.contains(&WorkspaceEffect::Persist));
    assert_eq!(effects.len(), 2);
}

#[test]
fn template_response_ingests_first_ui_prompt() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetTemplateResponse(TemplateResponse {
            prompts: vec!["system".to_string()],
            ui_prompts: vec![
                STARTER_LOG.to_string(),
                r#"<agentAction type="shell">ignored</agentAction>"#.to_string(),
            ],
        }),
    );

    assert_eq!(state.steps.len(), 4);
    assert!(state.template.is_some());
}

#[test]
fn template_without_ui_prompts_keeps_steps() {
    let mut state = state();
    state.steps = vec![shell_step(1, "ls")];
    let effects = run_runtime(
        &mut state,
        RuntimeAction::SetTemplateResponse(TemplateResponse::default()),
    );

    assert_eq!(state.steps.len(), 1);
    assert_eq!(effects, vec![WorkspaceEffect::Persist]);
}

#[test]
fn step_ids_restart_on_every_ingestion() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(
            r#"<agentAction type="shell">npm test</agentAction>"#.to_string(),
        ),
    );

    let ids: Vec<u64> = state.steps.iter().map(|step| step.id).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(state.steps[0].title, "Execute npm test");
}

#[test]
fn empty_response_logs_error_and_keeps_steps() {
    let mut state = state();
    state.steps = vec![shell_step(1, "ls")];
    run_runtime(&mut state, RuntimeAction::SetChatResponse("  \n".to_string()));

    assert_eq!(state.steps.len(), 1);
    let last = state.logs.iter().last().expect("log entry");
    assert_eq!(last.level, LogLevel::Error);
    assert_eq!(last.source, LogSource::Parser);
}

#[test]
fn skipped_actions_are_logged_as_warnings() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(
            r#"<agentAction type="file">orphan</agentAction>
<agentAction type="deploy">now</agentAction>
<agentAction type="shell">ls</agentAction>"#
                .to_string(),
        ),
    );

    assert_eq!(state.steps.len(), 1);
    let warnings = state
        .logs
        .iter()
        .filter(|entry| entry.level == LogLevel::Warn)
        .count();
    assert_eq!(warnings, 2);
}

#[test]
fn manual_mode_leaves_steps_pending() {
    let mut state = manual_state();
    let effects = run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );

    assert_eq!(state.pending_count(), 4);
    assert!(state.files.is_empty());
    assert!(!has_mount(&effects));
}

#[test]
fn reset_chat_response_keeps_steps() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );
    let effects = run_runtime(&mut state, RuntimeAction::ResetChatResponse);

    assert_eq!(state.chat_response, None);
    assert_eq!(state.steps.len(), 4);
    assert_eq!(effects, vec![WorkspaceEffect::Persist]);
}
