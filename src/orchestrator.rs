// src/orchestrator.rs

//! Entry point for embedding callers.
//!
//! An [`Orchestrator`] is a plain value: build one with
//! [`Orchestrator::new`], optionally attach an observer, and call
//! [`command`](Orchestrator::command), [`pipe`](Orchestrator::pipe) or
//! [`interact`](Orchestrator::interact). Nothing is registered globally and
//! no state survives between calls.
//!
//! Options apply to every call:
//! - `dir` is used for specs that do not set their own working directory;
//! - `timeout` bounds the whole operation. On expiry the running processes
//!   are killed and [`PipexecError::Timeout`] is returned.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::errors::{PipexecError, Result};
use crate::exec::{
    CommandOutput, InteractiveScanner, PipeOutput, ProgressObserver, ScanResult, TracingObserver,
    TriggerSet, run_command, run_pipe,
};
use crate::types::{CaptureMode, CommandSpec, MissingTriggerPolicy, TriggerMode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Default working directory.
    pub dir: Option<PathBuf>,
    pub capture: CaptureMode,
    pub on_missing_trigger: MissingTriggerPolicy,
    pub trigger_mode: TriggerMode,
    pub timeout: Option<Duration>,
}

impl From<&ConfigFile> for OrchestratorOptions {
    fn from(cfg: &ConfigFile) -> Self {
        Self {
            dir: cfg.defaults.dir.clone(),
            capture: cfg.defaults.capture,
            on_missing_trigger: cfg.defaults.on_missing_trigger,
            trigger_mode: cfg.defaults.trigger_mode,
            timeout: cfg.defaults.timeout,
        }
    }
}

pub struct Orchestrator {
    options: OrchestratorOptions,
    observer: Arc<dyn ProgressObserver>,
}

impl Orchestrator {
    /// Create an orchestrator that reports progress through `tracing`.
    pub fn new(options: OrchestratorOptions) -> Self {
        Self {
            options,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Run one command and return its output (stdout or combined, per
    /// `capture`).
    pub async fn command(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let spec = self.resolve(spec);
        let observer = Arc::clone(&self.observer);
        self.with_deadline(
            spec.program(),
            run_command(&spec, self.options.capture, observer),
        )
        .await
    }

    /// Run `first | second` and return the second command's stdout.
    pub async fn pipe(&self, first: CommandSpec, second: CommandSpec) -> Result<PipeOutput> {
        let first = self.resolve(first);
        let second = self.resolve(second);
        let observer = Arc::clone(&self.observer);
        self.with_deadline(first.program(), run_pipe(&first, &second, observer))
            .await
    }

    /// Run `spec` interactively: wait until a line contains one of
    /// `triggers`, send `input`, return the lines printed afterwards.
    pub async fn interact<S: AsRef<str>>(
        &self,
        spec: CommandSpec,
        triggers: &[S],
        input: &str,
    ) -> Result<ScanResult> {
        let spec = self.resolve(spec);
        let triggers = TriggerSet::with_mode(self.options.trigger_mode, triggers)?;
        let scanner = InteractiveScanner::new(Arc::clone(&self.observer))
            .with_policy(self.options.on_missing_trigger);

        self.with_deadline(spec.program(), scanner.scan(&spec, &triggers, input))
            .await
    }

    fn resolve(&self, spec: CommandSpec) -> CommandSpec {
        spec.or_dir(self.options.dir.as_deref())
    }

    async fn with_deadline<T, F>(&self, program: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.options.timeout {
            None => fut.await,
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(PipexecError::Timeout {
                    program: program.to_string(),
                    limit,
                }),
            },
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(OrchestratorOptions::default())
    }
}
