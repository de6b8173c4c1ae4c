// src/exec/scanner.rs

//! Interactive "wait for prompt, then answer" execution.
//!
//! A run goes through two phases:
//!
//! 1. **Scanning**: stdout is read line by line and each line is checked
//!    against the [`TriggerSet`]. The first matching line ends the phase.
//!    Reaching EOF without a match also ends it; what happens next depends on
//!    the [`MissingTriggerPolicy`]. Scanned lines go to the observer and are
//!    then discarded.
//! 2. **Interacting**: the input line is written once, stdin is closed once,
//!    and every remaining stdout line is collected until EOF. The process is
//!    then reaped.
//!
//! Stdout is read continuously during scanning and stderr is drained in the
//! background, so the child never blocks on a full pipe while we wait for
//! the trigger. Input is never written before the scanning phase has ended.

use std::io::ErrorKind;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::errors::{PipexecError, Result};
use crate::exec::handle::{ProcessHandle, StdinSource};
use crate::exec::observer::{ProgressEvent, ProgressObserver};
use crate::exec::trigger::TriggerSet;
use crate::types::{CommandSpec, ExitOutcome, MissingTriggerPolicy};

/// How the scanning phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// `line` contained the trigger at position `index` of the set.
    Matched {
        index: usize,
        trigger: String,
        line: String,
    },
    /// Output ended first.
    Exhausted { lines_scanned: usize },
}

impl TriggerOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, TriggerOutcome::Matched { .. })
    }
}

/// Result of one interactive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Stdout lines read after the input was sent, in order, without line
    /// terminators.
    pub lines: Vec<String>,
    pub trigger: TriggerOutcome,
    /// `false` if the process had already closed its stdin when we tried to
    /// write the input.
    pub input_delivered: bool,
    pub exit: ExitOutcome,
}

/// Line reader over process output.
///
/// Strips `\n` / `\r\n` and replaces invalid UTF-8 instead of failing, so a
/// stray binary byte cannot abort a scan.
///
/// Bytes of a line whose terminator has not arrived yet stay buffered and
/// can be inspected with [`partial`](Self::partial). Prompts are often
/// printed without a newline (`printf 'login: '`), so the scan matches
/// triggers against that partial line too.
pub struct OutputLines<R> {
    reader: R,
    buf: Vec<u8>,
}

/// One step of [`OutputLines`]: either a finished line or more bytes added
/// to the pending partial line.
enum Segment {
    Line(String),
    Partial,
}

impl<R: AsyncBufRead + Unpin> OutputLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Next line, or `None` at end-of-stream.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            match self.next_segment().await? {
                Some(Segment::Line(line)) => return Ok(Some(line)),
                Some(Segment::Partial) => continue,
                None => return Ok(None),
            }
        }
    }

    /// The unterminated tail read so far, if any.
    pub fn partial(&self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buf).into_owned())
        }
    }

    /// Reads whatever the underlying reader has buffered, up to the next
    /// newline. Returns `Partial` when the chunk ended mid-line.
    async fn next_segment(&mut self) -> std::io::Result<Option<Segment>> {
        let (consumed, complete) = {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(self.take_line().map(Segment::Line));
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    self.buf.extend_from_slice(&available[..i]);
                    (i + 1, true)
                }
                None => {
                    self.buf.extend_from_slice(available);
                    (available.len(), false)
                }
            }
        };
        self.reader.consume(consumed);

        if !complete {
            return Ok(Some(Segment::Partial));
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(Segment::Line(self.take_line().unwrap_or_default())))
    }

    fn take_line(&mut self) -> Option<String> {
        let line = self.partial();
        self.buf.clear();
        line
    }
}

/// Read lines until one matches a trigger or the stream ends.
///
/// Returns as soon as a match is found; the remaining output is left unread
/// in `lines`. A prompt that is not followed by a newline matches as soon as
/// it has been read. Whatever the process prints after it on the same line
/// becomes the first line of the remaining output.
pub async fn scan_until_triggered<R>(
    lines: &mut OutputLines<R>,
    triggers: &TriggerSet,
    program: &str,
    observer: &dyn ProgressObserver,
) -> std::io::Result<TriggerOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines_scanned = 0usize;

    while let Some(segment) = lines.next_segment().await? {
        let line = match segment {
            Segment::Line(line) => line,
            Segment::Partial => {
                let matched = lines
                    .partial()
                    .is_some_and(|partial| triggers.first_match(&partial).is_some());
                if !matched {
                    continue;
                }
                lines.take_line().unwrap_or_default()
            }
        };

        lines_scanned += 1;
        observer.on_event(&ProgressEvent::ScannedLine {
            program: program.to_string(),
            line: line.clone(),
        });

        if let Some((index, trigger)) = triggers.first_match(&line) {
            let trigger = trigger.as_str().to_string();
            observer.on_event(&ProgressEvent::TriggerMatched {
                program: program.to_string(),
                trigger: trigger.clone(),
                line: line.clone(),
            });
            return Ok(TriggerOutcome::Matched {
                index,
                trigger,
                line,
            });
        }
    }

    observer.on_event(&ProgressEvent::TriggersExhausted {
        program: program.to_string(),
        lines_scanned,
    });
    Ok(TriggerOutcome::Exhausted { lines_scanned })
}

/// Collect every remaining line until end-of-stream.
pub async fn collect_lines<R>(lines: &mut OutputLines<R>) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut out = Vec::new();
    while let Some(line) = lines.next_line().await? {
        out.push(line);
    }
    Ok(out)
}

/// Drives a single command through the scan-then-interact protocol.
pub struct InteractiveScanner {
    policy: MissingTriggerPolicy,
    observer: Arc<dyn ProgressObserver>,
}

impl InteractiveScanner {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            policy: MissingTriggerPolicy::default(),
            observer,
        }
    }

    pub fn with_policy(mut self, policy: MissingTriggerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start `spec`, wait for a trigger, send `input_line` and return what
    /// the process printed afterwards.
    ///
    /// `input_line` must be a single line; the `\n` is appended here.
    pub async fn scan(
        &self,
        spec: &CommandSpec,
        triggers: &TriggerSet,
        input_line: &str,
    ) -> Result<ScanResult> {
        if input_line.contains(['\n', '\r']) {
            return Err(PipexecError::InvalidInput(format!(
                "input for '{}' must be a single line",
                spec.program()
            )));
        }

        let program = spec.program();
        let mut handle = ProcessHandle::start(spec, StdinSource::Piped, Arc::clone(&self.observer))?;
        let stderr_drain = handle.spawn_stderr_drain()?;
        let mut lines = OutputLines::new(BufReader::new(handle.take_stdout()?));

        let trigger = scan_until_triggered(&mut lines, triggers, program, self.observer.as_ref())
            .await
            .map_err(|e| PipexecError::io(program, e))?;

        if !trigger.is_matched() && self.policy == MissingTriggerPolicy::Fail {
            handle.close_input()?;
            handle.wait().await?;
            let _ = stderr_drain.await;
            return Err(PipexecError::TriggerNotFound {
                program: program.to_string(),
                triggers: triggers.describe(),
            });
        }

        let input_delivered = match handle.write_line(input_line).await {
            Ok(bytes) => {
                self.observer.on_event(&ProgressEvent::InputWritten {
                    program: program.to_string(),
                    bytes,
                });
                true
            }
            Err(PipexecError::Io { source, .. }) if source.kind() == ErrorKind::BrokenPipe => {
                self.observer.on_event(&ProgressEvent::InputRejected {
                    program: program.to_string(),
                });
                false
            }
            Err(e) => return Err(e),
        };
        handle.close_input()?;

        let captured = collect_lines(&mut lines)
            .await
            .map_err(|e| PipexecError::io(program, e))?;
        let exit = handle.wait().await?;
        let _ = stderr_drain.await;

        Ok(ScanResult {
            lines: captured,
            trigger,
            input_delivered,
            exit,
        })
    }
}
