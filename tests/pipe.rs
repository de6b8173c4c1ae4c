// tests/pipe.rs
#![cfg(unix)]

mod common;
use crate::common::{
    init_tracing, read_pid, sh, sh_recording_pid, wait_until_gone, with_timeout,
};

use std::error::Error;
use std::time::Duration;

use pipexec::errors::PipexecError;
use pipexec::types::{CommandSpec, ExitOutcome, Stage};
use pipexec::{Orchestrator, OrchestratorOptions};

type TestResult = Result<(), Box<dyn Error>>;

/// `ls | grep go` over a directory with a known listing.
#[tokio::test]
async fn listing_filtered_by_grep_keeps_only_matching_lines() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    for name in ["README.md", "go.mod", "main.go", "notes.txt"] {
        std::fs::write(dir.path().join(name), "")?;
    }

    let orchestrator = Orchestrator::new(OrchestratorOptions {
        dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });
    let out = with_timeout(
        orchestrator.pipe(CommandSpec::new("ls"), CommandSpec::new("grep").arg("go")),
    )
    .await?;

    assert_eq!(out.output_lossy(), "go.mod\nmain.go\n");
    assert_eq!(out.first, ExitOutcome::Success);
    assert_eq!(out.second, ExitOutcome::Success);
    Ok(())
}

#[tokio::test]
async fn identity_filter_returns_the_producer_output_unchanged() -> TestResult {
    init_tracing();

    let producer = sh("printf 'alpha\\nbeta\\n\\tgamma  \\nno-trailing-newline'");
    let orchestrator = Orchestrator::default();

    let direct = with_timeout(orchestrator.command(producer.clone())).await?;
    let piped = with_timeout(orchestrator.pipe(producer, CommandSpec::new("cat"))).await?;

    assert_eq!(piped.output, direct.output.into_bytes());
    Ok(())
}

#[tokio::test]
async fn filter_with_no_output_yields_empty_result() -> TestResult {
    init_tracing();

    let orchestrator = Orchestrator::default();
    let out = with_timeout(orchestrator.pipe(
        CommandSpec::new("echo").arg("nothing to see"),
        CommandSpec::new("grep").arg("absent"),
    ))
    .await?;

    assert!(out.output.is_empty());
    // grep reports "no match" with exit 1; that is data, not an error.
    assert_eq!(out.second, ExitOutcome::Failed(1));
    Ok(())
}

#[tokio::test]
async fn large_stream_flows_between_stages_without_deadlock() -> TestResult {
    init_tracing();

    let orchestrator = Orchestrator::default();
    let out = with_timeout(orchestrator.pipe(
        CommandSpec::new("seq").args(["1", "200000"]),
        CommandSpec::new("wc").arg("-l"),
    ))
    .await?;

    assert_eq!(out.output_lossy().trim(), "200000");
    Ok(())
}

#[tokio::test]
async fn consumer_exiting_early_does_not_hang_the_producer() -> TestResult {
    init_tracing();

    let orchestrator = Orchestrator::default();
    let out = with_timeout(orchestrator.pipe(
        CommandSpec::new("seq").args(["1", "1000000"]),
        CommandSpec::new("head").args(["-n", "2"]),
    ))
    .await?;

    assert_eq!(out.output_lossy(), "1\n2\n");
    Ok(())
}

#[tokio::test]
async fn missing_first_program_is_tagged_with_stage_one() {
    init_tracing();

    let orchestrator = Orchestrator::default();
    let err = orchestrator
        .pipe(
            CommandSpec::new("pipexec-no-such-program"),
            CommandSpec::new("cat"),
        )
        .await
        .unwrap_err();

    match err {
        PipexecError::Pipe { stage, source } => {
            assert_eq!(stage, Stage::First);
            assert!(matches!(*source, PipexecError::Start { .. }));
        }
        other => panic!("expected Pipe error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_second_program_is_tagged_with_stage_two() {
    init_tracing();

    let orchestrator = Orchestrator::default();
    let err = with_timeout(orchestrator.pipe(
        CommandSpec::new("seq").args(["1", "1000000"]),
        CommandSpec::new("pipexec-no-such-program"),
    ))
    .await
    .unwrap_err();

    match err {
        PipexecError::Pipe { stage, source } => {
            assert_eq!(stage, Stage::Second);
            assert!(matches!(*source, PipexecError::Start { .. }));
        }
        other => panic!("expected Pipe error, got {other:?}"),
    }
}

#[tokio::test]
async fn deadline_kills_both_stages() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let producer_pid = dir.path().join("producer.pid");
    let consumer_pid = dir.path().join("consumer.pid");

    let orchestrator = Orchestrator::new(OrchestratorOptions {
        timeout: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    let err = with_timeout(orchestrator.pipe(
        sh_recording_pid(&producer_pid, "sleep 10"),
        sh_recording_pid(&consumer_pid, "cat"),
    ))
    .await
    .unwrap_err();

    assert!(matches!(err, PipexecError::Timeout { .. }));

    for pid_file in [&producer_pid, &consumer_pid] {
        let pid = read_pid(pid_file);
        assert!(wait_until_gone(pid).await, "stage {pid} survived the deadline");
    }
    Ok(())
}
