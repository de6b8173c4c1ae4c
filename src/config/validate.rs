// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{ConfigFile, Defaults, RawConfigFile, RawDefaults};
use crate::errors::{PipexecError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipexecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        Ok(ConfigFile {
            defaults: validate_defaults(raw.defaults)?,
        })
    }
}

fn validate_defaults(raw: RawDefaults) -> Result<Defaults> {
    let dir = match raw.dir {
        Some(dir) if dir.trim().is_empty() => {
            return Err(PipexecError::ConfigError(
                "[defaults].dir must not be empty; omit it to use the current directory"
                    .to_string(),
            ));
        }
        Some(dir) => Some(PathBuf::from(dir)),
        None => None,
    };

    let timeout = match raw.timeout {
        Some(s) => {
            let dur = parse_duration(&s)
                .map_err(|e| PipexecError::ConfigError(format!("[defaults].timeout: {e}")))?;
            if dur.is_zero() {
                return Err(PipexecError::ConfigError(
                    "[defaults].timeout must be greater than zero".to_string(),
                ));
            }
            Some(dur)
        }
        None => None,
    };

    Ok(Defaults {
        dir,
        capture: raw.capture,
        on_missing_trigger: raw.on_missing_trigger,
        trigger_mode: raw.trigger_mode,
        timeout,
    })
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{}'", s))
}
