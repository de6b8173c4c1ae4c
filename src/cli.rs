// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Commands are given as separate arguments and passed to the OS verbatim;
//! nothing here goes through a shell.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `pipexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipexec",
    version,
    about = "Run commands, two-stage pipelines and prompt-driven interactive sessions.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// If omitted, `Pipexec.toml` in the current directory is used when it
    /// exists.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Abort the operation after this long (e.g. `500ms`, `30s`, `2m`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, global = true)]
    pub timeout: Option<Duration>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run a command and print its output.
    Run {
        /// Working directory for the command.
        #[arg(long, value_name = "DIR")]
        dir: Option<String>,

        /// Capture stderr together with stdout.
        #[arg(long)]
        combined: bool,

        /// Program followed by its arguments.
        #[arg(
            value_name = "COMMAND",
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<String>,
    },

    /// Run `FIRST | SECOND` and print the output of SECOND.
    Pipe {
        /// Working directory for both commands.
        #[arg(long, value_name = "DIR")]
        dir: Option<String>,

        #[arg(long, value_name = "PROGRAM")]
        first: String,

        /// Argument for the first program (repeatable).
        #[arg(long = "first-arg", value_name = "ARG", allow_hyphen_values = true)]
        first_args: Vec<String>,

        #[arg(long, value_name = "PROGRAM")]
        second: String,

        /// Argument for the second program (repeatable).
        #[arg(long = "second-arg", value_name = "ARG", allow_hyphen_values = true)]
        second_args: Vec<String>,
    },

    /// Wait for a trigger in the output, send one line of input, print what
    /// follows.
    Interact {
        /// Working directory for the command.
        #[arg(long, value_name = "DIR")]
        dir: Option<String>,

        /// Text to wait for (repeatable; the first one found wins).
        #[arg(long = "trigger", value_name = "TEXT")]
        triggers: Vec<String>,

        /// Line to send once a trigger was seen.
        #[arg(long, value_name = "LINE", allow_hyphen_values = true)]
        input: String,

        /// Treat triggers as regular expressions.
        #[arg(long)]
        regex: bool,

        /// Fail instead of sending the input when no trigger shows up.
        #[arg(long)]
        fail_on_missing_trigger: bool,

        /// Program followed by its arguments.
        #[arg(
            value_name = "COMMAND",
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_keeps_hyphenated_arguments_for_the_child() {
        let args = CliArgs::try_parse_from(["pipexec", "run", "--", "ls", "-l", "-a"]).unwrap();
        match args.command {
            Commands::Run { command, .. } => assert_eq!(command, vec!["ls", "-l", "-a"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn pipe_collects_stage_arguments() {
        let args = CliArgs::try_parse_from([
            "pipexec",
            "pipe",
            "--first",
            "ls",
            "--first-arg",
            "-l",
            "--second",
            "grep",
            "--second-arg",
            "go",
        ])
        .unwrap();
        match args.command {
            Commands::Pipe {
                first,
                first_args,
                second,
                second_args,
                ..
            } => {
                assert_eq!(first, "ls");
                assert_eq!(first_args, vec!["-l"]);
                assert_eq!(second, "grep");
                assert_eq!(second_args, vec!["go"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_timeout_is_parsed_as_duration() {
        let args = CliArgs::try_parse_from([
            "pipexec",
            "interact",
            "--timeout",
            "2s",
            "--trigger",
            "ready>",
            "--input",
            "ping",
            "--",
            "sh",
            "-c",
            "read x",
        ])
        .unwrap();
        assert_eq!(args.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn oversized_timeout_is_a_usage_error() {
        let result = CliArgs::try_parse_from([
            "pipexec",
            "--timeout",
            "6000000000000000000h",
            "run",
            "--",
            "true",
        ]);
        let err = result.err().expect("overflowing timeout must be rejected");
        assert!(err.to_string().contains("too large"));
    }
}
