use super::state::TemplateResponse;
use super::step::Step;

#[derive(Debug, Clone)]
pub enum WorkspaceAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

/// Direct edits made from the UI layer.
#[derive(Debug, Clone)]
pub enum UserAction {
    SetPrompt(String),
    ToggleStep { id: u64 },
    SelectFile { path: String },
    ToggleFolder { path: String },
    EditSelectedFile { content: String },
    EditFile { path: String, content: String },
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    SetTemplateResponse(TemplateResponse),
    ResetTemplateResponse,
    SetChatResponse(String),
    ResetChatResponse,
    ReplaceSteps(Vec<Step>),
    ResetSteps,
    ApplyPendingSteps,
    ServerReady { port: u16, url: String },
    AppendLog(String),
    ClearLogs,
}
