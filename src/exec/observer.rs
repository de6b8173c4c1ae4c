// src/exec/observer.rs

//! Progress reporting for the execution layer.
//!
//! The process code never logs on its own. Everything worth knowing about a
//! run (start, scanned lines, trigger hits, stderr, exit) is sent as a
//! [`ProgressEvent`] to a [`ProgressObserver`]. Production uses
//! [`TracingObserver`], which turns events into `tracing` records; tests can
//! plug in a recorder instead.

use tracing::{debug, info, warn};

use crate::types::ExitOutcome;

/// Something that happened while driving a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        program: String,
        pid: Option<u32>,
    },
    /// A line read while looking for a trigger. Not part of any result.
    ScannedLine {
        program: String,
        line: String,
    },
    TriggerMatched {
        program: String,
        trigger: String,
        line: String,
    },
    /// Output ended without any trigger showing up.
    TriggersExhausted {
        program: String,
        lines_scanned: usize,
    },
    InputWritten {
        program: String,
        bytes: usize,
    },
    /// The process closed its stdin before the input could be written.
    InputRejected {
        program: String,
    },
    StderrLine {
        program: String,
        line: String,
    },
    Exited {
        program: String,
        outcome: ExitOutcome,
    },
}

/// Receiver of [`ProgressEvent`]s.
///
/// Called from the task driving the process and from background stderr
/// drains, hence `Send + Sync`.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { program, pid } => {
                info!(program = %program, pid = ?pid, "process started");
            }
            ProgressEvent::ScannedLine { program, line } => {
                debug!(program = %program, "stdout: {}", line);
            }
            ProgressEvent::TriggerMatched {
                program,
                trigger,
                line,
            } => {
                info!(program = %program, trigger = %trigger, line = %line, "trigger found");
            }
            ProgressEvent::TriggersExhausted {
                program,
                lines_scanned,
            } => {
                warn!(
                    program = %program,
                    lines_scanned,
                    "output ended before any trigger appeared"
                );
            }
            ProgressEvent::InputWritten { program, bytes } => {
                debug!(program = %program, bytes, "input written and stdin closed");
            }
            ProgressEvent::InputRejected { program } => {
                warn!(program = %program, "process closed stdin before input could be written");
            }
            ProgressEvent::StderrLine { program, line } => {
                debug!(program = %program, "stderr: {}", line);
            }
            ProgressEvent::Exited { program, outcome } => match outcome {
                ExitOutcome::Success => {
                    info!(program = %program, exit_code = 0, "process exited");
                }
                ExitOutcome::Failed(code) => {
                    // Often expected (e.g. grep without matches).
                    info!(
                        program = %program,
                        exit_code = code,
                        success = false,
                        "process exited with non-zero status"
                    );
                }
            },
        }
    }
}

/// Observer that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}
