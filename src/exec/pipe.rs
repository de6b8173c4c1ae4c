// src/exec/pipe.rs

//! Two-stage pipelines (`first | second`).
//!
//! The first stage's stdout descriptor is handed to the second stage as its
//! stdin, so data flows between the two processes through the kernel without
//! passing through this process. Only the second stage's stdout is read here.
//!
//! Deadlock rules:
//! - both stages are running before anything blocks on a read;
//! - each stage's stderr is drained in the background so a noisy stderr can
//!   never stall a stage;
//! - the parent keeps no copy of the link, so the second stage sees EOF as
//!   soon as the first one exits, and the first stage gets `EPIPE` if the
//!   second one goes away early.

use std::process::Stdio;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::errors::{PipexecError, Result};
use crate::exec::command::read_all;
use crate::exec::handle::{ProcessHandle, StdinSource};
use crate::exec::observer::ProgressObserver;
use crate::types::{CommandSpec, ExitOutcome, Stage};

/// Result of [`run_pipe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeOutput {
    /// Everything the second stage wrote to stdout. Empty if it filtered
    /// everything out.
    pub output: Vec<u8>,
    pub first: ExitOutcome,
    pub second: ExitOutcome,
}

impl PipeOutput {
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Run `first | second` and return the second stage's stdout.
///
/// Any failure is reported as [`PipexecError::Pipe`] tagged with the stage
/// it came from. If the second stage cannot be started, the already running
/// first stage is still reaped before returning.
pub async fn run_pipe(
    first: &CommandSpec,
    second: &CommandSpec,
    observer: Arc<dyn ProgressObserver>,
) -> Result<PipeOutput> {
    let mut producer = ProcessHandle::start(first, StdinSource::Null, Arc::clone(&observer))
        .map_err(|e| e.in_stage(Stage::First))?;
    let producer_stderr = producer
        .spawn_stderr_drain()
        .map_err(|e| e.in_stage(Stage::First))?;

    let link = match bind_stdout(&mut producer) {
        Ok(link) => link,
        Err(e) => {
            producer.kill().await;
            join_drain(producer_stderr).await;
            return Err(e.in_stage(Stage::First));
        }
    };

    let mut consumer = match ProcessHandle::start(second, StdinSource::Upstream(link), observer) {
        Ok(handle) => handle,
        Err(e) => {
            // The link was dropped with the failed command, so the producer
            // terminates on its next write instead of blocking forever.
            let _ = producer.wait().await;
            join_drain(producer_stderr).await;
            return Err(e.in_stage(Stage::Second));
        }
    };
    let consumer_stderr = consumer
        .spawn_stderr_drain()
        .map_err(|e| e.in_stage(Stage::Second))?;

    let read = match consumer.take_stdout() {
        Ok(stdout) => read_all(stdout)
            .await
            .map_err(|e| PipexecError::io(second.program(), e)),
        Err(e) => Err(e),
    };

    let first_exit = producer.wait().await;
    let second_exit = consumer.wait().await;
    join_drain(producer_stderr).await;
    join_drain(consumer_stderr).await;

    let output = read.map_err(|e| e.in_stage(Stage::Second))?;

    Ok(PipeOutput {
        output,
        first: first_exit.map_err(|e| e.in_stage(Stage::First))?,
        second: second_exit.map_err(|e| e.in_stage(Stage::Second))?,
    })
}

/// Turn the producer's stdout pipe into a `Stdio` for the consumer.
fn bind_stdout(producer: &mut ProcessHandle) -> Result<Stdio> {
    let stdout = producer.take_stdout()?;
    let link: std::io::Result<Stdio> = stdout.try_into();
    link.map_err(|e| PipexecError::io(producer.program(), e))
}

async fn join_drain(drain: JoinHandle<()>) {
    let _ = drain.await;
}
