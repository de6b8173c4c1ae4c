// src/exec/command.rs

//! Run a single command to completion and capture its output.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::{PipexecError, Result};
use crate::exec::handle::{ProcessHandle, StdinSource};
use crate::exec::observer::ProgressObserver;
use crate::types::{CaptureMode, CommandSpec, ExitOutcome};

/// Captured output of [`run_command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Stdout, or stdout+stderr for [`CaptureMode::Combined`]. Invalid UTF-8
    /// is replaced lossily.
    pub output: String,
    pub exit: ExitOutcome,
}

/// Run `spec` with stdin closed, read its output to EOF and reap it.
///
/// A non-zero exit is returned in [`CommandOutput::exit`] together with the
/// output; only start and I/O failures are errors.
pub async fn run_command(
    spec: &CommandSpec,
    capture: CaptureMode,
    observer: Arc<dyn ProgressObserver>,
) -> Result<CommandOutput> {
    let mut handle = ProcessHandle::start(spec, StdinSource::Null, observer)?;
    let stdout = handle.take_stdout()?;

    let (bytes, stderr_drain) = match capture {
        CaptureMode::Stdout => {
            let drain = handle.spawn_stderr_drain()?;
            let bytes = read_all(stdout)
                .await
                .map_err(|e| PipexecError::io(spec.program(), e))?;
            (bytes, Some(drain))
        }
        CaptureMode::Combined => {
            let stderr = handle.take_stderr()?;
            let bytes = read_interleaved(stdout, stderr)
                .await
                .map_err(|e| PipexecError::io(spec.program(), e))?;
            (bytes, None)
        }
    };

    let exit = handle.wait().await?;
    if let Some(drain) = stderr_drain {
        let _ = drain.await;
    }

    Ok(CommandOutput {
        output: String::from_utf8_lossy(&bytes).into_owned(),
        exit,
    })
}

pub(crate) async fn read_all<R>(mut reader: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Read two streams to EOF, appending chunks in the order they arrive.
async fn read_interleaved<A, B>(mut a: A, mut b: B) -> std::io::Result<Vec<u8>>
where
    A: AsyncRead + Unpin,
    B: AsyncRead + Unpin,
{
    let mut out = Vec::new();
    let mut buf_a = [0u8; 4096];
    let mut buf_b = [0u8; 4096];
    let mut a_done = false;
    let mut b_done = false;

    while !(a_done && b_done) {
        tokio::select! {
            n = a.read(&mut buf_a), if !a_done => {
                let n = n?;
                if n == 0 {
                    a_done = true;
                } else {
                    out.extend_from_slice(&buf_a[..n]);
                }
            }
            n = b.read(&mut buf_b), if !b_done => {
                let n = n?;
                if n == 0 {
                    b_done = true;
                } else {
                    out.extend_from_slice(&buf_b[..n]);
                }
            }
        }
    }

    Ok(out)
}
