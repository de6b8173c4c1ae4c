// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything here drives real OS processes through `tokio::process` and
//! reports progress through a [`ProgressObserver`] rather than logging.
//!
//! - [`handle`] owns one spawned process and its stdio pipes.
//! - [`command`] runs a single command to completion.
//! - [`pipe`] runs a two-stage `first | second` pipeline.
//! - [`scanner`] runs a command interactively: wait for a trigger line,
//!   then send one line of input.
//! - [`trigger`] holds the trigger matching rules.
//! - [`observer`] defines progress events and the default `tracing` sink.

pub mod command;
pub mod handle;
pub mod observer;
pub mod pipe;
pub mod scanner;
pub mod trigger;

pub use command::{CommandOutput, run_command};
pub use handle::{ProcessHandle, StdinSource};
pub use observer::{NullObserver, ProgressEvent, ProgressObserver, TracingObserver};
pub use pipe::{PipeOutput, run_pipe};
pub use scanner::{InteractiveScanner, ScanResult, TriggerOutcome};
pub use trigger::{Trigger, TriggerSet};
