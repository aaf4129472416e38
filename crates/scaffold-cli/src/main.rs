use std::env;
use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use scaffold_core::actions::RuntimeAction;
use scaffold_core::actions::WorkspaceAction;
use scaffold_core::config::Config;
use scaffold_core::parser::Parser;
use scaffold_core::persistence::JsonFileStore;
use scaffold_core::persistence::MemoryStore;
use scaffold_core::persistence::StateStore;
use scaffold_core::reducer::WorkspaceEffect;
use scaffold_core::selection::render_outline;
use scaffold_core::state::LogLevel;
use scaffold_core::state::WorkspaceState;
use scaffold_core::step::Step;
use scaffold_core::step::StepStatus;
use scaffold_core::tree::count_files;
use scaffold_core::workspace::Workspace;
use scaffold_exec::preview::boot_preview;
use scaffold_exec::runtime::DirectoryRuntime;
use scaffold_exec::runtime::SandboxRuntime;

mod args;

use args::Command;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let invocation = args::parse(env::args().skip(1).collect())?;

    match invocation.command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("scaffold {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    init_tracing();
    let config = load_config(invocation.config.as_deref())?;

    match invocation.command {
        Command::Parse { file, json } => parse_command(&config, &file, json),
        Command::Build { file, out, dry_run } => build_command(&config, &file, &out, dry_run),
        Command::Preview { out } => preview_command(&config, &out),
        Command::Status { out } => status_command(&config, &out),
        Command::Help | Command::Version => Ok(()),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("SCAFFOLD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    let Some(default_path) = dirs::config_dir().map(|dir| dir.join("scaffold").join("config.toml"))
    else {
        return Ok(Config::default());
    };
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "loading config");
        Ok(Config::load(&default_path)?)
    } else {
        Ok(Config::default())
    }
}

fn read_input(file: &Path) -> io::Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    fs::read_to_string(file)
}

fn store_path(config: &Config, out: &Path) -> PathBuf {
    out.join(&config.store.dir_name).join(&config.store.file_name)
}

fn parse_command(config: &Config, file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(file)?;
    let outcome = Parser::new(config.pipeline.limits).parse(&text)?;

    if json {
        let payload = serde_json::json!({
            "steps": outcome.steps,
            "diagnostics": outcome.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for diagnostic in &outcome.diagnostics {
        eprintln!("{diagnostic}");
    }
    for step in &outcome.steps {
        println!("{}", step_line(step));
    }
    println!("{} steps", outcome.steps.len());
    Ok(())
}

fn build_command(
    config: &Config,
    file: &Path,
    out: &Path,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(file)?;

    let state = if dry_run {
        let mut workspace = Workspace::open(config, MemoryStore::default())?;
        ingest(&mut workspace, text, None)?;
        workspace.state().clone()
    } else {
        let store = JsonFileStore::open(store_path(config, out))?;
        let mut workspace = Workspace::open(config, store)?;
        let mut runtime = DirectoryRuntime::new(out);
        ingest(&mut workspace, text, Some(&mut runtime))?;
        workspace.state().clone()
    };

    print_problems(&state);
    print!("{}", render_outline(&state.files, None));
    print_summary(&state);
    if dry_run {
        println!("dry run: nothing written");
    } else {
        println!("wrote {} files to {}", count_files(&state.files), out.display());
    }
    Ok(())
}

/// Feeds `text` in as a chat response, applies anything left pending and
/// mounts the last committed tree into `runtime`.
fn ingest<S: StateStore>(
    workspace: &mut Workspace<S>,
    text: String,
    mut runtime: Option<&mut DirectoryRuntime>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut effects = workspace.dispatch(WorkspaceAction::Runtime(RuntimeAction::SetChatResponse(
        text,
    )))?;
    effects.extend(workspace.dispatch(WorkspaceAction::Runtime(
        RuntimeAction::ApplyPendingSteps,
    ))?);

    let last_mount = effects.into_iter().rev().find_map(|effect| match effect {
        WorkspaceEffect::Mount(tree) => Some(tree),
        _ => None,
    });
    if let (Some(tree), Some(runtime)) = (last_mount, runtime.as_deref_mut()) {
        let report = runtime.mount(&tree)?;
        tracing::info!(
            runtime = runtime.name(),
            files = report.files,
            directories = report.directories,
            "mounted build output"
        );
    }
    Ok(())
}

fn preview_command(config: &Config, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !out.is_dir() {
        return Err(format!("{} is not a directory; run `scaffold build` first", out.display()).into());
    }
    let store = JsonFileStore::open(store_path(config, out))?;
    let mut workspace = Workspace::open(config, store)?;

    let mut runtime = DirectoryRuntime::new(out);
    let handle = boot_preview(&mut runtime, &config.preview)?;
    for line in &handle.output {
        workspace.dispatch(WorkspaceAction::Runtime(RuntimeAction::AppendLog(line.clone())))?;
    }
    workspace.dispatch(WorkspaceAction::Runtime(RuntimeAction::ServerReady {
        port: handle.ready.port,
        url: handle.ready.url.clone(),
    }))?;

    if let Some(url) = workspace.state().preview.url.as_deref() {
        println!("preview ready at {url}");
    }
    let code = handle.wait()?;
    println!("dev server exited ({})", code.map_or_else(|| "signal".to_string(), |code| code.to_string()));
    Ok(())
}

fn status_command(config: &Config, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = store_path(config, out);
    if !path.exists() {
        println!("no workspace at {}", out.display());
        return Ok(());
    }
    let workspace = Workspace::open(config, JsonFileStore::open(&path)?)?;
    let state = workspace.state();

    if !state.prompt.is_empty() {
        println!("prompt: {}", state.prompt);
    }
    for step in &state.steps {
        println!("{}", step_line(step));
    }
    print_summary(state);
    Ok(())
}

fn step_line(step: &Step) -> String {
    let mark = match step.status {
        StepStatus::Completed => 'x',
        StepStatus::InProgress => '~',
        StepStatus::Pending => ' ',
    };
    format!(
        "{:>3}. [{mark}] {:<11} {} ({})",
        step.id,
        step.kind.label(),
        step.title,
        step.status.label()
    )
}

fn print_problems(state: &WorkspaceState) {
    for entry in state.logs.iter() {
        if matches!(entry.level, LogLevel::Warn | LogLevel::Error) {
            eprintln!(
                "{}: {}: {}",
                entry.level.label(),
                entry.source.label(),
                entry.message
            );
        }
    }
}

fn print_summary(state: &WorkspaceState) {
    println!(
        "{} steps ({} completed, {} pending)",
        state.steps.len(),
        state.completed_count(),
        state.pending_count()
    );
}

fn print_help() {
    println!("scaffold {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  scaffold parse FILE [--json]");
    println!("  scaffold build FILE --out DIR [--dry-run]");
    println!("  scaffold preview --out DIR");
    println!("  scaffold status --out DIR");
    println!("  scaffold --help");
    println!("  scaffold --version");
    println!();
    println!("Options:");
    println!("  --config PATH   read settings from PATH (.toml, .yaml or .yml)");
    println!("  FILE may be - to read from stdin. Set SCAFFOLD_LOG to adjust logging.");
}
