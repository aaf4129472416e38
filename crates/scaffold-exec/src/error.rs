#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("sandbox i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("refusing to mount entry named {name:?}")]
    UnsafeName { name: String },
    #[error("no command configured for {purpose}")]
    MissingCommand { purpose: &'static str },
    #[error("`{command}` exited with {}", exit_label(.code))]
    CommandFailed { command: String, code: Option<i32> },
    #[error("`{command}` stopped before reporting a server url")]
    ServerExited { command: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed by signal)".to_string(),
    }
}
