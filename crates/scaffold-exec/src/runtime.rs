use std::fs;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::sync::mpsc;
use std::thread;

use scaffold_core::mount::MountEntry;
use scaffold_core::mount::MountTree;

use crate::contracts::CommandSpec;
use crate::contracts::MountReport;
use crate::contracts::ProcessOutcome;
use crate::contracts::ServerReady;
use crate::error::RuntimeError;
use crate::preview::detect_server_ready;
use crate::preview::strip_ansi_sequences;

pub trait SandboxRuntime {
    fn name(&self) -> &'static str;

    fn mount(&mut self, tree: &MountTree) -> Result<MountReport, RuntimeError>;

    fn run(&mut self, command: &CommandSpec) -> Result<ProcessOutcome, RuntimeError>;

    /// Starts a long-running `command` and returns once it announces a local
    /// URL.
    fn serve(&mut self, command: &CommandSpec) -> Result<ServerHandle, RuntimeError>;
}

#[derive(Debug)]
pub struct ServerHandle {
    pub ready: ServerReady,
    pub output: Vec<String>,
    child: Option<Child>,
}

impl ServerHandle {
    pub fn detached(ready: ServerReady, output: Vec<String>) -> Self {
        Self {
            ready,
            output,
            child: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.child.is_some()
    }

    pub fn wait(mut self) -> Result<Option<i32>, RuntimeError> {
        match self.child.take() {
            Some(mut child) => Ok(child.wait()?.code()),
            None => Ok(None),
        }
    }

    pub fn stop(mut self) -> Result<(), RuntimeError> {
        if let Some(mut child) = self.child.take() {
            child.kill()?;
            child.wait()?;
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryRuntime {
    root: PathBuf,
}

impl DirectoryRuntime {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&self.root);
        cmd
    }
}

impl SandboxRuntime for DirectoryRuntime {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn mount(&mut self, tree: &MountTree) -> Result<MountReport, RuntimeError> {
        validate_names(tree)?;
        fs::create_dir_all(&self.root)?;
        let mut report = MountReport::default();
        write_entries(&self.root, tree, &mut report)?;
        tracing::debug!(
            root = %self.root.display(),
            files = report.files,
            directories = report.directories,
            "mounted tree"
        );
        Ok(report)
    }

    fn run(&mut self, command: &CommandSpec) -> Result<ProcessOutcome, RuntimeError> {
        tracing::info!(command = %command, "running sandbox command");
        let output = self
            .command(command)
            .stdin(Stdio::null())
            .output()?;

        let mut lines = Vec::new();
        for stream in [&output.stdout, &output.stderr] {
            let text = strip_ansi_sequences(&String::from_utf8_lossy(stream));
            lines.extend(
                text.lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_string),
            );
        }

        Ok(ProcessOutcome {
            exit_code: output.status.code(),
            output: lines,
        })
    }

    fn serve(&mut self, command: &CommandSpec) -> Result<ServerHandle, RuntimeError> {
        tracing::info!(command = %command, "starting dev server");
        let mut child = self
            .command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let (tx, rx) = mpsc::channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx.clone());
        }
        drop(tx);

        let mut output = Vec::new();
        for line in rx.iter() {
            let ready = detect_server_ready(&line);
            output.push(line);
            if let Some(ready) = ready {
                tracing::info!(url = %ready.url, "dev server ready");
                return Ok(ServerHandle {
                    ready,
                    output,
                    child: Some(child),
                });
            }
        }

        let status = child.wait()?;
        tracing::warn!(command = %command, code = ?status.code(), "dev server exited early");
        Err(RuntimeError::ServerExited {
            command: command.to_string(),
        })
    }
}

/// Reads `stream` line by line on a helper thread. The pipe keeps draining
/// after the receiver is gone so the child never blocks on a full buffer.
fn forward_lines<R>(stream: R, tx: mpsc::Sender<String>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            let line = strip_ansi_sequences(&line);
            if line.trim().is_empty() {
                continue;
            }
            let _ = tx.send(line);
        }
    });
}

fn write_entries(dir: &Path, tree: &MountTree, report: &mut MountReport) -> Result<(), RuntimeError> {
    for (name, entry) in tree {
        let path = dir.join(name);
        match entry {
            MountEntry::Directory { directory } => {
                fs::create_dir_all(&path)?;
                report.directories += 1;
                write_entries(&path, directory, report)?;
            }
            MountEntry::File { file } => {
                fs::write(&path, &file.contents)?;
                report.files += 1;
            }
        }
    }
    Ok(())
}

fn validate_names(tree: &MountTree) -> Result<(), RuntimeError> {
    for (name, entry) in tree {
        if !is_safe_name(name) {
            return Err(RuntimeError::UnsafeName { name: name.clone() });
        }
        if let MountEntry::Directory { directory } = entry {
            validate_names(directory)?;
        }
    }
    Ok(())
}

fn is_safe_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

fn count_entries(tree: &MountTree, report: &mut MountReport) {
    for entry in tree.values() {
        match entry {
            MountEntry::Directory { directory } => {
                report.directories += 1;
                count_entries(directory, report);
            }
            MountEntry::File { .. } => report.files += 1,
        }
    }
}

const VITE_READY_OUTPUT: [&str; 3] = [
    "> dev",
    "  VITE v5.4.0  ready in 312 ms",
    "  \u{1b}[32m➜\u{1b}[39m  Local:   \u{1b}[36mhttp://localhost:\u{1b}[1m5173\u{1b}[22m/\u{1b}[39m",
];

#[derive(Debug, Clone)]
pub struct RecordingRuntime {
    mounted: MountTree,
    mounts: usize,
    commands: Vec<CommandSpec>,
    exit_code: i32,
    server_output: Vec<String>,
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self {
            mounted: MountTree::new(),
            mounts: 0,
            commands: Vec::new(),
            exit_code: 0,
            server_output: VITE_READY_OUTPUT.iter().map(|line| line.to_string()).collect(),
        }
    }
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_server_output<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_output = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn mounted(&self) -> &MountTree {
        &self.mounted
    }

    pub fn mounts(&self) -> usize {
        self.mounts
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }
}

impl SandboxRuntime for RecordingRuntime {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn mount(&mut self, tree: &MountTree) -> Result<MountReport, RuntimeError> {
        validate_names(tree)?;
        let mut report = MountReport::default();
        count_entries(tree, &mut report);
        self.mounted = tree.clone();
        self.mounts += 1;
        Ok(report)
    }

    fn run(&mut self, command: &CommandSpec) -> Result<ProcessOutcome, RuntimeError> {
        self.commands.push(command.clone());
        Ok(ProcessOutcome {
            exit_code: Some(self.exit_code),
            output: Vec::new(),
        })
    }

    fn serve(&mut self, command: &CommandSpec) -> Result<ServerHandle, RuntimeError> {
        self.commands.push(command.clone());
        let mut output = Vec::new();
        for line in &self.server_output {
            let line = strip_ansi_sequences(line);
            let ready = detect_server_ready(&line);
            output.push(line);
            if let Some(ready) = ready {
                return Ok(ServerHandle::detached(ready, output));
            }
        }
        Err(RuntimeError::ServerExited {
            command: command.to_string(),
        })
    }
}
