// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod orchestrator;
pub mod types;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::cli::{CliArgs, Commands};
use crate::config::{ConfigFile, default_config_path, load_and_validate};
use crate::exec::TriggerOutcome;
use crate::types::{CaptureMode, CommandSpec, ExitOutcome, MissingTriggerPolicy, TriggerMode};

pub use crate::errors::{PipexecError, Result as PipexecResult};
pub use crate::orchestrator::{Orchestrator, OrchestratorOptions};

/// High-level entry point used by `main.rs`.
///
/// Loads the optional config, applies CLI overrides, runs the requested
/// operation and writes its output to stdout. Returns the exit code the
/// binary should finish with (that of the final command).
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_config(args.config.as_deref())?;

    let mut options = OrchestratorOptions::from(&cfg);
    if let Some(timeout) = args.timeout {
        options.timeout = Some(timeout);
    }

    let exit = match args.command {
        Commands::Run {
            dir,
            combined,
            command,
        } => {
            if combined {
                options.capture = CaptureMode::Combined;
            }
            let spec = spec_from_argv(command, dir)?;
            let orchestrator = Orchestrator::new(options);

            let out = orchestrator
                .command(spec.clone())
                .await
                .with_context(|| format!("running '{spec}'"))?;

            write_stdout(out.output.as_bytes())?;
            out.exit
        }

        Commands::Pipe {
            dir,
            first,
            first_args,
            second,
            second_args,
        } => {
            let first = with_dir(CommandSpec::new(first).args(first_args), dir.as_deref());
            let second = with_dir(CommandSpec::new(second).args(second_args), dir.as_deref());
            let orchestrator = Orchestrator::new(options);

            let out = orchestrator
                .pipe(first.clone(), second.clone())
                .await
                .with_context(|| format!("running '{first} | {second}'"))?;

            if !out.first.is_success() {
                debug!(exit_code = out.first.code(), "first pipeline stage exited non-zero");
            }
            write_stdout(&out.output)?;
            out.second
        }

        Commands::Interact {
            dir,
            triggers,
            input,
            regex,
            fail_on_missing_trigger,
            command,
        } => {
            if regex {
                options.trigger_mode = TriggerMode::Regex;
            }
            if fail_on_missing_trigger {
                options.on_missing_trigger = MissingTriggerPolicy::Fail;
            }
            let spec = spec_from_argv(command, dir)?;
            let orchestrator = Orchestrator::new(options);

            let result = orchestrator
                .interact(spec.clone(), &triggers, &input)
                .await
                .with_context(|| format!("interacting with '{spec}'"))?;

            if let TriggerOutcome::Exhausted { lines_scanned } = result.trigger {
                warn!(
                    lines_scanned,
                    "no trigger seen; input was sent after output ended"
                );
            }

            let mut text = String::new();
            for line in &result.lines {
                text.push_str(line);
                text.push('\n');
            }
            write_stdout(text.as_bytes())?;
            result.exit
        }
    };

    Ok(match exit {
        ExitOutcome::Success => 0,
        ExitOutcome::Failed(code) if code > 0 => code,
        ExitOutcome::Failed(_) => 1,
    })
}

/// Explicit `--config` must load; the implicit default is optional.
fn load_config(explicit: Option<&str>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => load_and_validate(path).with_context(|| format!("loading config {path}")),
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_and_validate(&path)
                    .with_context(|| format!("loading config {}", path.display()))
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

fn spec_from_argv(argv: Vec<String>, dir: Option<String>) -> Result<CommandSpec> {
    let mut argv = argv.into_iter();
    let program = argv.next().context("no program given")?;
    Ok(with_dir(CommandSpec::new(program).args(argv), dir.as_deref()))
}

fn with_dir(spec: CommandSpec, dir: Option<&str>) -> CommandSpec {
    match dir {
        Some(dir) => spec.dir(Path::new(dir)),
        None => spec,
    }
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).context("writing to stdout")?;
    stdout.flush().context("flushing stdout")?;
    Ok(())
}
