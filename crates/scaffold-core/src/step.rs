use serde::Deserialize;
use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::diagnostics::DiagnosticCode;
use crate::extract::Action;
use crate::normalize::normalize;
use crate::tree::split_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    RunScript,
    CreateFile,
}

impl StepKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::RunScript => "Run script",
            Self::CreateFile => "Create file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

impl StepStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Completed => Self::Pending,
            Self::Pending | Self::InProgress => Self::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub kind: StepKind,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Step {
    pub fn is_pending(&self) -> bool {
        self.status == StepStatus::Pending
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub steps: Vec<Step>,
    pub diagnostics: Vec<Diagnostic>,
}

pub const MAX_TITLE_COMMAND_CHARS: usize = 50;
const TRUNCATED_TITLE_CHARS: usize = 47;

const INSTALL_COMMANDS: [(&str, &[&str]); 4] = [
    ("npm", &["install", "i", "add"]),
    ("yarn", &["add"]),
    ("pnpm", &["add", "install", "i"]),
    ("bun", &["add", "install", "i"]),
];

const COMMAND_FAMILIES: [&str; 6] = ["npm", "yarn", "pnpm", "bun", "npx", "git"];

/// Turns actions into steps. Bodies are normalized here, once per action.
/// Skipped actions do not consume an id, so emitted ids are consecutive from
/// `start_id`.
pub fn synthesize(actions: &[Action], start_id: u64) -> Synthesis {
    let mut synthesis = Synthesis::default();
    let mut next_id = start_id;

    for (index, action) in actions.iter().enumerate() {
        match step_from_action(action, next_id) {
            Ok(step) => {
                tracing::debug!(id = step.id, title = %step.title, "synthesized step");
                synthesis.steps.push(step);
                next_id += 1;
            }
            Err(diagnostic) => synthesis.diagnostics.push(diagnostic.at(index as u64)),
        }
    }

    synthesis
}

fn step_from_action(action: &Action, id: u64) -> Result<Step, Diagnostic> {
    match action.kind.as_str() {
        "file" => {
            let Some(path) = action.target_path.as_deref() else {
                return Err(Diagnostic::warn(
                    DiagnosticCode::MissingFilePath,
                    "file action missing filePath attribute",
                ));
            };
            let segments = split_path(path).map_err(|err| {
                Diagnostic::warn(DiagnosticCode::InvalidFilePath, err.to_string())
            })?;
            let file_name = segments.last().copied().unwrap_or(path);

            Ok(Step {
                id,
                title: format!("Create \"{file_name}\""),
                description: format!("Create file at {path}"),
                kind: StepKind::CreateFile,
                status: StepStatus::Pending,
                code: Some(normalize(&action.body)),
                path: Some(path.to_string()),
            })
        }
        "shell" => {
            let command = normalize(&action.body).trim().to_string();
            if command.is_empty() {
                return Err(Diagnostic::warn(
                    DiagnosticCode::EmptyCommand,
                    "shell action has empty command",
                ));
            }

            Ok(Step {
                id,
                title: shell_title(&command),
                description: format!("Execute: {command}"),
                kind: StepKind::RunScript,
                status: StepStatus::Pending,
                code: Some(command),
                path: None,
            })
        }
        other => Err(Diagnostic::warn(
            DiagnosticCode::UnknownKind,
            format!("unknown action type: {other}"),
        )),
    }
}

pub fn shell_title(command: &str) -> String {
    let command = command.trim();
    let tokens: Vec<&str> = command.split_whitespace().collect();

    if let [manager, sub, rest @ ..] = tokens.as_slice() {
        let is_install = INSTALL_COMMANDS
            .iter()
            .any(|(name, subs)| name == manager && subs.contains(sub));
        if is_install {
            let packages: Vec<&str> = rest
                .iter()
                .copied()
                .filter(|token| !token.starts_with('-'))
                .collect();
            if packages.is_empty() {
                return "Install dependencies".to_string();
            }
            return format!("Install {}", packages.join(" "));
        }
    }

    if let Some((family, rest)) = tokens.split_first() {
        if COMMAND_FAMILIES.contains(family) {
            let sub = rest.first().copied().unwrap_or("command");
            return format!("Execute {family} {sub}");
        }
    }

    if command.chars().count() > MAX_TITLE_COMMAND_CHARS {
        let head: String = command.chars().take(TRUNCATED_TITLE_CHARS).collect();
        return format!("Execute {head}...");
    }

    format!("Execute {command}")
}
