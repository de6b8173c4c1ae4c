// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{CaptureMode, MissingTriggerPolicy, TriggerMode};

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [defaults]
/// dir = "/srv/app"
/// capture = "combined"
/// on_missing_trigger = "fail"
/// trigger_mode = "regex"
/// timeout = "30s"
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub defaults: RawDefaults,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDefaults {
    /// Working directory for commands that do not set one.
    #[serde(default)]
    pub dir: Option<String>,

    /// `"stdout"` (default) or `"combined"`.
    #[serde(default)]
    pub capture: CaptureMode,

    /// `"proceed"` (default) or `"fail"`.
    #[serde(default)]
    pub on_missing_trigger: MissingTriggerPolicy,

    /// `"substring"` (default) or `"regex"`.
    #[serde(default)]
    pub trigger_mode: TriggerMode,

    /// Duration string such as `"250ms"`, `"30s"`, `"2m"`.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defaults {
    pub dir: Option<PathBuf>,
    pub capture: CaptureMode,
    pub on_missing_trigger: MissingTriggerPolicy,
    pub trigger_mode: TriggerMode,
    pub timeout: Option<Duration>,
}
