use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Info,
    Warn,
    Error,
}

impl DiagnosticLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    NoActions,
    MalformedTag,
    UnterminatedBlock,
    ActionLimitReached,
    MissingFilePath,
    InvalidFilePath,
    EmptyCommand,
    UnknownKind,
    PathCollision,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoActions => "no_actions",
            Self::MalformedTag => "malformed_tag",
            Self::UnterminatedBlock => "unterminated_block",
            Self::ActionLimitReached => "action_limit_reached",
            Self::MissingFilePath => "missing_file_path",
            Self::InvalidFilePath => "invalid_file_path",
            Self::EmptyCommand => "empty_command",
            Self::UnknownKind => "unknown_kind",
            Self::PathCollision => "path_collision",
        }
    }
}

/// A non-fatal finding produced while parsing or applying steps.
///
/// `index` is the position of the offending action (extraction and synthesis)
/// or the id of the offending step (tree building), when one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: DiagnosticCode,
    pub message: String,
    pub index: Option<u64>,
}

impl Diagnostic {
    pub fn warn(code: DiagnosticCode, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            level: DiagnosticLevel::Warn,
            code,
            message: message.into(),
            index: None,
        };
        tracing::warn!(code = code.as_str(), "{}", diagnostic.message);
        diagnostic
    }

    pub fn at(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(
                f,
                "[{}] {} (#{index}): {}",
                self.level.label(),
                self.code.as_str(),
                self.message
            ),
            None => write!(
                f,
                "[{}] {}: {}",
                self.level.label(),
                self.code.as_str(),
                self.message
            ),
        }
    }
}
