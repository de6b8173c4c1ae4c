#![allow(dead_code)]

use pipexec::config::{ConfigFile, RawConfigFile, RawDefaults};
use pipexec::types::{CaptureMode, MissingTriggerPolicy, TriggerMode};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Goes through `RawConfigFile` + `TryFrom`, so the result has passed the
/// same validation as a config loaded from disk.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                defaults: RawDefaults::default(),
            },
        }
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.config.defaults.dir = Some(dir.to_string());
        self
    }

    pub fn capture(mut self, capture: CaptureMode) -> Self {
        self.config.defaults.capture = capture;
        self
    }

    pub fn on_missing_trigger(mut self, policy: MissingTriggerPolicy) -> Self {
        self.config.defaults.on_missing_trigger = policy;
        self
    }

    pub fn trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.config.defaults.trigger_mode = mode;
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.config.defaults.timeout = Some(duration.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
