// src/exec/handle.rs

//! Ownership of a single spawned process and its standard streams.
//!
//! A [`ProcessHandle`] owns the `tokio::process::Child` plus each stdio pipe
//! as an `Option`. Taking or closing a stream leaves `None` behind, so any
//! later use fails with [`PipexecError::ClosedStream`] instead of silently
//! touching a dead descriptor.
//!
//! Children are spawned with `kill_on_drop(true)`: dropping a handle (for
//! example when a deadline expires) never leaves a process running.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::errors::{PipexecError, Result};
use crate::exec::observer::{ProgressEvent, ProgressObserver};
use crate::types::{CommandSpec, ExitOutcome, StreamKind};

/// Where a new process reads its stdin from. Stdout and stderr are always
/// piped back to us.
#[derive(Debug)]
pub enum StdinSource {
    /// `/dev/null`; the process sees EOF immediately.
    Null,
    /// A pipe we can write to via [`ProcessHandle::write_line`].
    Piped,
    /// An already-open descriptor, usually the stdout of an upstream stage.
    Upstream(Stdio),
}

impl StdinSource {
    fn is_piped(&self) -> bool {
        matches!(self, StdinSource::Piped)
    }

    fn into_stdio(self) -> Stdio {
        match self {
            StdinSource::Null => Stdio::null(),
            StdinSource::Piped => Stdio::piped(),
            StdinSource::Upstream(stdio) => stdio,
        }
    }
}

pub struct ProcessHandle {
    spec: CommandSpec,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    observer: Arc<dyn ProgressObserver>,
}

impl ProcessHandle {
    /// Spawn `spec` with the given stdin source.
    ///
    /// Fails with [`PipexecError::Start`] if the program cannot be launched
    /// (not found, not executable, bad working directory) or a requested pipe
    /// is missing afterwards. In the latter case the child is killed before
    /// returning.
    pub fn start(
        spec: &CommandSpec,
        stdin: StdinSource,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Self> {
        let wants_stdin = stdin.is_piped();

        let mut cmd = Command::new(spec.program());
        cmd.args(spec.arguments());
        if let Some(dir) = spec.working_dir() {
            cmd.current_dir(dir);
        }
        cmd.stdin(stdin.into_stdio())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let spawned = cmd.spawn();
        // The command still holds our copy of an upstream descriptor; release
        // it so the downstream process is the only reader.
        drop(cmd);

        let mut child = spawned.map_err(|source| PipexecError::Start {
            program: spec.program().to_string(),
            source,
        })?;

        let child_stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        if (wants_stdin && child_stdin.is_none()) || stdout.is_none() || stderr.is_none() {
            let _ = child.start_kill();
            return Err(PipexecError::Start {
                program: spec.program().to_string(),
                source: std::io::Error::other("stdio pipe unavailable after spawn"),
            });
        }

        observer.on_event(&ProgressEvent::Started {
            program: spec.program().to_string(),
            pid: child.id(),
        });

        Ok(Self {
            spec: spec.clone(),
            child,
            stdin: child_stdin,
            stdout,
            stderr,
            observer,
        })
    }

    pub fn program(&self) -> &str {
        self.spec.program()
    }

    /// OS process id, or `None` once the process has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Write `line` followed by `\n` and flush. Returns the number of bytes
    /// written.
    pub async fn write_line(&mut self, line: &str) -> Result<usize> {
        let program = self.spec.program();
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| closed(program, StreamKind::Stdin))?;

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        stdin
            .write_all(&buf)
            .await
            .map_err(|e| PipexecError::io(program, e))?;
        stdin
            .flush()
            .await
            .map_err(|e| PipexecError::io(program, e))?;

        Ok(buf.len())
    }

    /// Close stdin so the process sees end-of-input.
    pub fn close_input(&mut self) -> Result<()> {
        match self.stdin.take() {
            Some(stdin) => {
                drop(stdin);
                Ok(())
            }
            None => Err(closed(self.spec.program(), StreamKind::Stdin)),
        }
    }

    /// Hand the stdout pipe to the caller. Only possible once.
    pub fn take_stdout(&mut self) -> Result<ChildStdout> {
        self.stdout
            .take()
            .ok_or_else(|| closed(self.spec.program(), StreamKind::Stdout))
    }

    pub fn take_stderr(&mut self) -> Result<ChildStderr> {
        self.stderr
            .take()
            .ok_or_else(|| closed(self.spec.program(), StreamKind::Stderr))
    }

    /// Consume stderr in the background so the process never blocks on a
    /// full stderr pipe. Each line goes to the observer.
    pub fn spawn_stderr_drain(&mut self) -> Result<JoinHandle<()>> {
        let stderr = self.take_stderr()?;
        let observer = Arc::clone(&self.observer);
        let program = self.spec.program().to_string();

        Ok(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                observer.on_event(&ProgressEvent::StderrLine {
                    program: program.clone(),
                    line,
                });
            }
        }))
    }

    /// Wait for the process to exit. Our end of stdin is closed first so a
    /// process waiting for input cannot deadlock the wait.
    pub async fn wait(&mut self) -> Result<ExitOutcome> {
        self.stdin.take();

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| PipexecError::io(self.spec.program(), e))?;
        let outcome = ExitOutcome::from(status);

        self.observer.on_event(&ProgressEvent::Exited {
            program: self.spec.program().to_string(),
            outcome,
        });

        Ok(outcome)
    }

    /// Kill the process and reap it. Errors are ignored: the process may
    /// already be gone.
    pub async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

fn closed(program: &str, stream: StreamKind) -> PipexecError {
    PipexecError::ClosedStream {
        program: program.to_string(),
        stream,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::exec::observer::NullObserver;
    use tokio::io::AsyncReadExt;

    fn observer() -> Arc<dyn ProgressObserver> {
        Arc::new(NullObserver)
    }

    #[tokio::test]
    async fn missing_program_is_a_start_error() {
        let spec = CommandSpec::new("definitely-not-a-real-program-4711");
        let err = ProcessHandle::start(&spec, StdinSource::Null, observer())
            .err()
            .expect("start must fail");
        match err {
            PipexecError::Start { program, .. } => {
                assert_eq!(program, "definitely-not-a-real-program-4711")
            }
            other => panic!("expected Start error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_working_dir_is_a_start_error() {
        let spec = CommandSpec::new("true").dir("/definitely/not/a/dir/4711");
        let result = ProcessHandle::start(&spec, StdinSource::Null, observer());
        assert!(matches!(result, Err(PipexecError::Start { .. })));
    }

    #[tokio::test]
    async fn stdin_is_unusable_after_close() {
        let spec = CommandSpec::new("cat");
        let mut handle = ProcessHandle::start(&spec, StdinSource::Piped, observer()).unwrap();

        handle.close_input().unwrap();

        let write = handle.write_line("late").await;
        assert!(matches!(
            write,
            Err(PipexecError::ClosedStream {
                stream: StreamKind::Stdin,
                ..
            })
        ));
        assert!(matches!(
            handle.close_input(),
            Err(PipexecError::ClosedStream { .. })
        ));

        assert_eq!(handle.wait().await.unwrap(), ExitOutcome::Success);
    }

    #[tokio::test]
    async fn stdout_can_only_be_taken_once() {
        let spec = CommandSpec::new("echo").arg("hi");
        let mut handle = ProcessHandle::start(&spec, StdinSource::Null, observer()).unwrap();

        let mut stdout = handle.take_stdout().unwrap();
        let mut out = String::new();
        stdout.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hi\n");

        assert!(matches!(
            handle.take_stdout(),
            Err(PipexecError::ClosedStream {
                stream: StreamKind::Stdout,
                ..
            })
        ));
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn pid_is_cleared_once_the_process_is_reaped() {
        let spec = CommandSpec::new("true");
        let mut handle = ProcessHandle::start(&spec, StdinSource::Null, observer()).unwrap();

        assert!(handle.pid().is_some_and(|pid| pid > 0));
        handle.wait().await.unwrap();
        assert_eq!(handle.pid(), None);
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let spec = CommandSpec::new("sh").args(["-c", "exit 3"]);
        let mut handle = ProcessHandle::start(&spec, StdinSource::Null, observer()).unwrap();
        assert_eq!(handle.wait().await.unwrap(), ExitOutcome::Failed(3));
    }

    #[tokio::test]
    async fn written_line_reaches_the_process() {
        let spec = CommandSpec::new("cat");
        let mut handle = ProcessHandle::start(&spec, StdinSource::Piped, observer()).unwrap();

        let written = handle.write_line("ping").await.unwrap();
        assert_eq!(written, 5);
        handle.close_input().unwrap();

        let mut out = String::new();
        handle
            .take_stdout()
            .unwrap()
            .read_to_string(&mut out)
            .await
            .unwrap();
        assert_eq!(out, "ping\n");
        handle.wait().await.unwrap();
    }
}
