use std::sync::OnceLock;

use regex::Regex;
use scaffold_core::config::PreviewConfig;

use crate::contracts::CommandSpec;
use crate::contracts::ServerReady;
use crate::error::RuntimeError;
use crate::runtime::SandboxRuntime;
use crate::runtime::ServerHandle;

const LOCAL_URL_PATTERN: &str =
    r"https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1\]):(\d{1,5})[^\s]*";

fn local_url() -> Option<&'static Regex> {
    static LOCAL_URL: OnceLock<Option<Regex>> = OnceLock::new();
    LOCAL_URL
        .get_or_init(|| Regex::new(LOCAL_URL_PATTERN).ok())
        .as_ref()
}

/// Finds the first local server URL in a line of dev-server output.
pub fn detect_server_ready(line: &str) -> Option<ServerReady> {
    let line = strip_ansi_sequences(line);
    let captures = local_url()?.captures(&line)?;
    let port = captures.get(1)?.as_str().parse::<u16>().ok()?;
    let url = captures.get(0)?.as_str();
    Some(ServerReady {
        port,
        url: url.to_string(),
    })
}

/// Removes CSI escape sequences and carriage returns.
pub fn strip_ansi_sequences(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            if chars.peek() == Some(&'[') {
                let _ = chars.next();
                for n in chars.by_ref() {
                    if ('@'..='~').contains(&n) {
                        break;
                    }
                }
            }
            continue;
        }
        if c == '\r' {
            continue;
        }
        out.push(c);
    }
    out
}

/// Installs dependencies and starts the dev server inside `runtime`. The tree
/// must already be mounted. The install must exit with status 0.
pub fn boot_preview<R>(runtime: &mut R, config: &PreviewConfig) -> Result<ServerHandle, RuntimeError>
where
    R: SandboxRuntime + ?Sized,
{
    let install = CommandSpec::from_argv(&config.install_command).ok_or(
        RuntimeError::MissingCommand {
            purpose: "dependency install",
        },
    )?;
    let dev = CommandSpec::from_argv(&config.dev_command).ok_or(RuntimeError::MissingCommand {
        purpose: "dev server",
    })?;

    tracing::info!(runtime = runtime.name(), command = %install, "installing dependencies");
    let outcome = runtime.run(&install)?;
    if !outcome.success() {
        for line in outcome.output.iter().rev().take(20).rev() {
            tracing::warn!("{line}");
        }
        return Err(RuntimeError::CommandFailed {
            command: install.to_string(),
            code: outcome.exit_code,
        });
    }

    let handle = runtime.serve(&dev)?;
    tracing::info!(port = handle.ready.port, url = %handle.ready.url, "preview ready");
    Ok(handle)
}
