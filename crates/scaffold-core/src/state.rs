use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::config::Config;
use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::DiagnosticLevel;
use crate::selection::Selection;
use crate::step::Step;
use crate::step::StepStatus;
use crate::tree::FileNode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub prompts: Vec<String>,
    pub ui_prompts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub url: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<DiagnosticLevel> for LogLevel {
    fn from(level: DiagnosticLevel) -> Self {
        match level {
            DiagnosticLevel::Info => Self::Info,
            DiagnosticLevel::Warn => Self::Warn,
            DiagnosticLevel::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Parser,
    Tree,
    Sandbox,
    User,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Parser => "parser",
            Self::Tree => "tree",
            Self::Sandbox => "sandbox",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<i64>,
    pub source: LogSource,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: LogSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            ts_ms: Some(chrono::Utc::now().timestamp_millis()),
            source,
            message: message.into(),
        }
    }

    pub fn from_diagnostic(source: LogSource, diagnostic: &Diagnostic) -> Self {
        Self::new(diagnostic.level.into(), source, diagnostic.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            next_seq: 1,
            buf: VecDeque::with_capacity(cap.max(1)),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceState {
    pub prompt: String,
    pub template: Option<TemplateResponse>,
    pub chat_response: Option<String>,
    pub steps: Vec<Step>,
    pub files: Vec<FileNode>,
    pub selection: Selection,
    pub preview: PreviewState,
    pub logs: LogBuffer,
    pub pipeline: PipelineConfig,
    pub tree_revision: u64,
}

impl WorkspaceState {
    pub fn new(config: &Config) -> Self {
        Self {
            prompt: String::new(),
            template: None,
            chat_response: None,
            steps: Vec::new(),
            files: Vec::new(),
            selection: Selection::default(),
            preview: PreviewState::default(),
            logs: LogBuffer::new(config.logs.capacity),
            pipeline: config.pipeline.clone(),
            tree_revision: 0,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.status == StepStatus::Completed)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_pending()).count()
    }

    pub fn selected_file(&self) -> Option<&FileNode> {
        self.selection.selected_file(&self.files)
    }

    pub fn log(&mut self, level: LogLevel, source: LogSource, message: impl Into<String>) {
        self.logs.append(LogEntry::new(level, source, message));
    }
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
