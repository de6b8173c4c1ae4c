// src/exec/trigger.rs

//! Trigger matching for the interactive scanner.

use regex::Regex;

use crate::errors::Result;
use crate::types::TriggerMode;

/// A single trigger.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Matches when the line contains this text anywhere.
    Substring(String),
    /// Matches when the regex finds a match anywhere in the line.
    Pattern(Regex),
}

impl Trigger {
    pub fn is_match(&self, line: &str) -> bool {
        match self {
            Trigger::Substring(s) => line.contains(s.as_str()),
            Trigger::Pattern(re) => re.is_match(line),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Trigger::Substring(s) => s,
            Trigger::Pattern(re) => re.as_str(),
        }
    }
}

/// Ordered list of triggers. When several match the same line, the earliest
/// one in the list wins.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    pub fn substrings<I, S>(triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triggers: triggers
                .into_iter()
                .map(|s| Trigger::Substring(s.into()))
                .collect(),
        }
    }

    /// Compile every entry as a regex. Fails on the first invalid pattern.
    pub fn patterns<I, S>(triggers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let triggers = triggers
            .into_iter()
            .map(|s| Regex::new(s.as_ref()).map(Trigger::Pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { triggers })
    }

    pub fn with_mode<I, S>(mode: TriggerMode, triggers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match mode {
            TriggerMode::Substring => Ok(Self::substrings(
                triggers.into_iter().map(|s| s.as_ref().to_string()),
            )),
            TriggerMode::Regex => Self::patterns(triggers),
        }
    }

    /// First trigger (in list order) that matches `line`, with its index.
    pub fn first_match(&self, line: &str) -> Option<(usize, &Trigger)> {
        self.triggers
            .iter()
            .enumerate()
            .find(|(_, t)| t.is_match(line))
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn describe(&self) -> Vec<String> {
        self.triggers.iter().map(|t| t.as_str().to_string()).collect()
    }
}
