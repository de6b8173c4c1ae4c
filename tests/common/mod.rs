#![allow(dead_code)]

pub use pipexec_test_utils::{RecordingObserver, init_tracing, sh, with_timeout};

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use pipexec::types::CommandSpec;
use pipexec::{Orchestrator, OrchestratorOptions};

/// Orchestrator with the given options whose events land in the returned
/// recorder.
pub fn recorded(options: OrchestratorOptions) -> (Orchestrator, RecordingObserver) {
    let recorder = RecordingObserver::new();
    let orchestrator = Orchestrator::new(options).with_observer(Arc::new(recorder.clone()));
    (orchestrator, recorder)
}

/// `sh` script that records its pid in `pid_file` and then becomes
/// `command`, so the recorded pid is the long-running process itself.
pub fn sh_recording_pid(pid_file: &Path, command: &str) -> CommandSpec {
    sh(&format!("echo $$ > '{}'; exec {command}", pid_file.display()))
}

pub fn read_pid(pid_file: &Path) -> u32 {
    std::fs::read_to_string(pid_file)
        .unwrap_or_else(|e| panic!("pid file {} not written: {e}", pid_file.display()))
        .trim()
        .parse()
        .expect("pid file holds a number")
}

/// Whether `pid` still names a running process. A zombie waiting to be
/// reaped counts as gone.
pub fn is_running(pid: u32) -> bool {
    let signalable = std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    signalable && !is_zombie(pid)
}

fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            stat.rsplit_once(") ")
                .map(|(_, rest)| rest.starts_with('Z'))
        })
        .unwrap_or(false)
}

/// Poll until `pid` is gone, for at most three seconds.
pub async fn wait_until_gone(pid: u32) -> bool {
    for _ in 0..60 {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !is_running(pid)
}
