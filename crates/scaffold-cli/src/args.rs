use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Parse { file: PathBuf, json: bool },
    Build { file: PathBuf, out: PathBuf, dry_run: bool },
    Preview { out: PathBuf },
    Status { out: PathBuf },
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Default)]
struct Flags {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    json: bool,
    dry_run: bool,
    positional: Vec<String>,
}

pub fn parse(args: Vec<String>) -> Result<Invocation, Box<dyn std::error::Error>> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Invocation {
            config: None,
            command: Command::Help,
        });
    };

    let command = command.as_str();
    if matches!(command, "--help" | "-h" | "help") {
        return Ok(Invocation {
            config: None,
            command: Command::Help,
        });
    }
    if matches!(command, "--version" | "-V" | "version") {
        return Ok(Invocation {
            config: None,
            command: Command::Version,
        });
    }

    let flags = parse_flags(rest)?;
    let command = match command {
        "parse" => {
            reject(flags.out.is_some(), "--out", command)?;
            reject(flags.dry_run, "--dry-run", command)?;
            Command::Parse {
                file: single_file(&flags.positional, command)?,
                json: flags.json,
            }
        }
        "build" => {
            reject(flags.json, "--json", command)?;
            let Some(out) = flags.out.clone() else {
                return Err("build requires --out DIR".into());
            };
            Command::Build {
                file: single_file(&flags.positional, command)?,
                out,
                dry_run: flags.dry_run,
            }
        }
        "preview" | "status" => {
            reject(flags.json, "--json", command)?;
            reject(flags.dry_run, "--dry-run", command)?;
            if let Some(extra) = flags.positional.first() {
                return Err(format!("unsupported argument: {extra}").into());
            }
            let Some(out) = flags.out.clone() else {
                return Err(format!("{command} requires --out DIR").into());
            };
            if command == "preview" {
                Command::Preview { out }
            } else {
                Command::Status { out }
            }
        }
        other => return Err(format!("unknown command: {other}").into()),
    };

    Ok(Invocation {
        config: flags.config,
        command,
    })
}

fn parse_flags(args: &[String]) -> Result<Flags, Box<dyn std::error::Error>> {
    let mut flags = Flags::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a path".into());
                };
                flags.config = Some(PathBuf::from(value));
                i += 2;
            }
            "--out" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--out requires a path".into());
                };
                flags.out = Some(PathBuf::from(value));
                i += 2;
            }
            "--json" => {
                flags.json = true;
                i += 1;
            }
            "--dry-run" => {
                flags.dry_run = true;
                i += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("unsupported argument: {other}").into());
            }
            other => {
                flags.positional.push(other.to_string());
                i += 1;
            }
        }
    }
    Ok(flags)
}

fn single_file(positional: &[String], command: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match positional {
        [file] => Ok(PathBuf::from(file)),
        [] => Err(format!("{command} requires a FILE argument").into()),
        [_, extra, ..] => Err(format!("unsupported argument: {extra}").into()),
    }
}

fn reject(present: bool, flag: &str, command: &str) -> Result<(), Box<dyn std::error::Error>> {
    if present {
        return Err(format!("{flag} is not valid for {command}").into());
    }
    Ok(())
}
