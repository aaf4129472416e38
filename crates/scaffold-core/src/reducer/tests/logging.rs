use super::*;
use pretty_assertions::assert_eq;

fn entries(state: &WorkspaceState) -> Vec<(LogLevel, LogSource, &str)> {
    state
        .logs
        .iter()
        .map(|entry| (entry.level, entry.source, entry.message.as_str()))
        .collect()
}

#[test]
fn parser_diagnostics_are_logged_before_the_summary() {
    let mut state = manual_state();
    run_runtime(
        &mut state,
        RuntimeAction::SetChatResponse(
            r#"<agentAction type="file">orphan</agentAction><agentAction type="shell">ls</agentAction>"#
                .to_string(),
        ),
    );

    let logged = entries(&state);
    assert_eq!(logged.len(), 2);
    assert_eq!((logged[0].0, logged[0].1), (LogLevel::Warn, LogSource::Parser));
    assert!(logged[0].2.contains("missing_file_path"));
    assert_eq!(logged[1], (LogLevel::Info, LogSource::Parser, "parsed 1 steps"));
}

#[test]
fn unparseable_response_logs_error_and_keeps_steps() {
    let mut state = state();
    state.steps = vec![shell_step(1, "ls")];
    run_runtime(&mut state, RuntimeAction::SetChatResponse("  \n".to_string()));

    assert_eq!(state.steps.len(), 1);
    let logged = entries(&state);
    assert_eq!(logged.len(), 1);
    assert_eq!((logged[0].0, logged[0].1), (LogLevel::Error, LogSource::Parser));
}

#[test]
fn tree_collisions_are_logged_from_the_tree() {
    let mut state = state();
    run_runtime(
        &mut state,
        RuntimeAction::ReplaceSteps(vec![
            file_step(1, "src", "a file named src"),
            file_step(2, "src/App.tsx", "nested"),
        ]),
    );

    let collisions: Vec<&str> = state
        .logs
        .iter()
        .filter(|entry| entry.source == LogSource::Tree)
        .map(|entry| entry.message.as_str())
        .collect();
    assert_eq!(collisions.len(), 1);
    assert!(collisions[0].contains("path_collision"));
    assert!(collisions[0].contains("src/App.tsx"));
}

#[test]
fn dev_server_output_respects_configured_capacity() {
    let mut config = Config::default();
    config.logs.capacity = 2;
    let mut state = WorkspaceState::new(&config);

    for line in ["> vite", "VITE ready in 300 ms", "Local: http://localhost:5173/"] {
        let effects = run_runtime(&mut state, RuntimeAction::AppendLog(line.to_string()));
        assert_eq!(effects, Vec::new());
    }

    let kept: Vec<(u64, &str)> = state
        .logs
        .iter()
        .map(|entry| (entry.seq, entry.message.as_str()))
        .collect();
    assert_eq!(
        kept,
        vec![(2, "VITE ready in 300 ms"), (3, "Local: http://localhost:5173/")]
    );
    assert!(state.logs.iter().all(|entry| entry.source == LogSource::Sandbox));
}

#[test]
fn clearing_logs_before_a_new_preview_restarts_numbering() {
    let mut state = state();
    run_runtime(&mut state, RuntimeAction::AppendLog("npm ERR! missing script".to_string()));
    run_runtime(&mut state, RuntimeAction::ClearLogs);
    run_runtime(
        &mut state,
        RuntimeAction::ServerReady {
            port: 5173,
            url: "http://localhost:5173/".to_string(),
        },
    );

    let logged: Vec<(u64, LogSource)> = state
        .logs
        .iter()
        .map(|entry| (entry.seq, entry.source))
        .collect();
    assert_eq!(logged, vec![(1, LogSource::Sandbox)]);
}
