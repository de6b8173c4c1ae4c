// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! A non-zero exit status is *not* an error here; it is reported as an
//! [`ExitOutcome`](crate::types::ExitOutcome) alongside whatever output was
//! captured.

use std::time::Duration;

use thiserror::Error;

use crate::types::{Stage, StreamKind};

#[derive(Error, Debug)]
pub enum PipexecError {
    /// The executable could not be launched, or one of its requested
    /// stdio pipes could not be created. No process is left running.
    #[error("failed to start '{program}': {source}")]
    Start {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stream was used after it was closed or handed off. This is a
    /// sequencing bug in the caller, not a runtime condition.
    #[error("{stream} of '{program}' is already closed")]
    ClosedStream { program: String, stream: StreamKind },

    #[error("pipeline stage {stage} failed: {source}")]
    Pipe {
        stage: Stage,
        #[source]
        source: Box<PipexecError>,
    },

    #[error("none of the triggers {triggers:?} appeared in the output of '{program}'")]
    TriggerNotFound {
        program: String,
        triggers: Vec<String>,
    },

    #[error("'{program}' did not finish within {limit:?}")]
    Timeout { program: String, limit: Duration },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("invalid trigger pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PipexecError {
    /// Wrap an error raised while driving one stage of a pipeline.
    pub fn in_stage(self, stage: Stage) -> Self {
        PipexecError::Pipe {
            stage,
            source: Box::new(self),
        }
    }

    pub(crate) fn io(program: &str, source: std::io::Error) -> Self {
        PipexecError::Io {
            program: program.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipexecError>;
