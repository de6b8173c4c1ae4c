// src/types.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::str::FromStr;

use serde::Deserialize;

/// One external command: program, arguments and an optional working
/// directory.
///
/// Arguments are passed to the OS verbatim; no shell is involved, so there is
/// no quoting or escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory. An empty path means "inherit the caller's
    /// current directory", same as never calling this.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir)
        };
        self
    }

    /// Fill in the working directory only if none was set.
    pub fn or_dir(self, dir: Option<&Path>) -> Self {
        match (&self.dir, dir) {
            (None, Some(d)) => self.dir(d),
            _ => self,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a process ended.
///
/// Purely informational: plenty of tools exit non-zero under normal
/// conditions (`grep` with no matches, for one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit code, or `-1` if the process was terminated by a signal.
    Failed(i32),
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }

    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failed(code) => *code,
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failed(status.code().unwrap_or(-1))
        }
    }
}

/// Position of a command in a two-stage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The producer, whose stdout feeds the next stage.
    First,
    /// The consumer, whose stdout is the pipeline's result.
    Second,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::First => write!(f, "1 (first)"),
            Stage::Second => write!(f, "2 (second)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdin => write!(f, "stdin"),
            StreamKind::Stdout => write!(f, "stdout"),
            StreamKind::Stderr => write!(f, "stderr"),
        }
    }
}

/// What the simple command runner captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Standard output only; stderr is drained and reported to the observer.
    Stdout,
    /// Stdout and stderr interleaved in the order chunks arrive.
    Combined,
}

impl Default for CaptureMode {
    fn default() -> Self {
        CaptureMode::Stdout
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(CaptureMode::Stdout),
            "combined" => Ok(CaptureMode::Combined),
            other => Err(format!(
                "invalid capture mode: {other} (expected \"stdout\" or \"combined\")"
            )),
        }
    }
}

/// Behaviour when the output of an interactive command ends before any
/// trigger was seen.
///
/// - `Proceed`: write the input anyway and collect whatever follows.
/// - `Fail`: close stdin, reap the process and report
///   [`PipexecError::TriggerNotFound`](crate::errors::PipexecError::TriggerNotFound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTriggerPolicy {
    Proceed,
    Fail,
}

impl Default for MissingTriggerPolicy {
    fn default() -> Self {
        MissingTriggerPolicy::Proceed
    }
}

impl FromStr for MissingTriggerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proceed" => Ok(MissingTriggerPolicy::Proceed),
            "fail" => Ok(MissingTriggerPolicy::Fail),
            other => Err(format!(
                "invalid on_missing_trigger: {other} (expected \"proceed\" or \"fail\")"
            )),
        }
    }
}

/// How trigger strings are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Plain substring containment.
    Substring,
    /// Each trigger is a regular expression searched within the line.
    Regex,
}

impl Default for TriggerMode {
    fn default() -> Self {
        TriggerMode::Substring
    }
}

impl FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(TriggerMode::Substring),
            "regex" => Ok(TriggerMode::Regex),
            other => Err(format!(
                "invalid trigger_mode: {other} (expected \"substring\" or \"regex\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dir_means_inherit() {
        let spec = CommandSpec::new("ls").dir("");
        assert_eq!(spec.working_dir(), None);
    }

    #[test]
    fn or_dir_keeps_explicit_dir() {
        let spec = CommandSpec::new("ls")
            .dir("/tmp")
            .or_dir(Some(Path::new("/var")));
        assert_eq!(spec.working_dir(), Some(Path::new("/tmp")));

        let spec = CommandSpec::new("ls").or_dir(Some(Path::new("/var")));
        assert_eq!(spec.working_dir(), Some(Path::new("/var")));
    }

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("grep").args(["-n", "go"]);
        assert_eq!(spec.to_string(), "grep -n go");
    }

    #[test]
    fn option_enums_parse_case_insensitively() {
        assert_eq!("Combined".parse::<CaptureMode>(), Ok(CaptureMode::Combined));
        assert_eq!(
            " fail ".parse::<MissingTriggerPolicy>(),
            Ok(MissingTriggerPolicy::Fail)
        );
        assert_eq!("REGEX".parse::<TriggerMode>(), Ok(TriggerMode::Regex));
        assert!("both".parse::<CaptureMode>().is_err());
    }
}
