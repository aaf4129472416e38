use super::*;
use pretty_assertions::assert_eq;

#[test]
fn toggle_step_flips_status_without_applying() {
    let mut state = manual_state();
    state.steps = vec![file_step(1, "a.txt", "x")];

    let effects = run_user(&mut state, UserAction::ToggleStep { id: 1 });
    assert_eq!(state.steps[0].status, StepStatus::Completed);
    assert!(state.files.is_empty());
    assert_eq!(effects, vec![WorkspaceEffect::Persist]);

    run_user(&mut state, UserAction::ToggleStep { id: 1 });
    assert_eq!(state.steps[0].status, StepStatus::Pending);
}

#[test]
fn toggle_unknown_step_has_no_effects() {
    let mut state = state();
    let effects = run_user(&mut state, UserAction::ToggleStep { id: 42 });
    assert_eq!(effects, Vec::new());
}

#[test]
fn set_prompt_is_persisted() {
    let mut state = state();
    let effects = run_user(&mut state, UserAction::SetPrompt("a blog".to_string()));
    assert_eq!(state.prompt, "a blog");
    assert_eq!(effects, vec![WorkspaceEffect::Persist]);
}

#[test]
fn editing_selected_file_remounts_tree() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );
    let revision = state.tree_revision;
    let selected = state.selection.selected_path.clone();

    let effects = run_user(
        &mut state,
        UserAction::EditSelectedFile {
            content: "{}".to_string(),
        },
    );

    assert_eq!(state.tree_revision, revision + 1);
    assert!(has_mount(&effects));
    assert!(!effects.contains(&WorkspaceEffect::Persist));
    assert_eq!(state.selection.selected_path, selected);
    assert_eq!(
        state.selected_file().and_then(FileNode::content),
        Some("{}")
    );
}

#[test]
fn editing_unknown_path_has_no_effects() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );

    let effects = run_user(
        &mut state,
        UserAction::EditFile {
            path: "/missing.ts".to_string(),
            content: "x".to_string(),
        },
    );
    assert_eq!(effects, Vec::new());
}

#[test]
fn editing_a_folder_path_has_no_effects() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(STARTER_LOG.to_string()),
    );

    let effects = run_user(
        &mut state,
        UserAction::EditFile {
            path: "/src".to_string(),
            content: "x".to_string(),
        },
    );
    assert_eq!(effects, Vec::new());
}

#[test]
fn server_ready_records_preview() {
    let mut state = state();
    let effects = run_runtime(
        &mut state,
        RuntimeAction::ServerReady {
            port: 5173,
            url: "http://localhost:5173/".to_string(),
        },
    );

    assert_eq!(state.preview.port, Some(5173));
    assert_eq!(state.preview.url.as_deref(), Some("http://localhost:5173/"));
    assert_eq!(effects, Vec::new());
}
