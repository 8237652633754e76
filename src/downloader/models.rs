// Common data models for the download pipeline

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::AttemptFailure;

/// A validated, normalized media URL.
///
/// Only produced by [`crate::downloader::url::validate_url`] and
/// [`crate::downloader::url::normalize`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MediaUrl(String);

impl MediaUrl {
    pub(crate) fn from_validated(url: String) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One command-line argument: a flag with an optional value.
///
/// In configuration files it is written as a one- or two-element array,
/// e.g. `["--format", "best"]` or `["--no-warnings"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Arg {
    pub flag: String,
    pub value: Option<String>,
}

impl Arg {
    pub fn flag(flag: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: None,
        }
    }

    pub fn pair(flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            value: Some(value.into()),
        }
    }
}

impl TryFrom<Vec<String>> for Arg {
    type Error = String;

    fn try_from(mut parts: Vec<String>) -> Result<Self, Self::Error> {
        match parts.len() {
            1 => Ok(Self::flag(parts.remove(0))),
            2 => {
                let value = parts.remove(1);
                Ok(Self::pair(parts.remove(0), value))
            }
            n => Err(format!("argument must have 1 or 2 elements, got {}", n)),
        }
    }
}

impl From<Arg> for Vec<String> {
    fn from(arg: Arg) -> Self {
        let mut parts = vec![arg.flag];
        parts.extend(arg.value);
        parts
    }
}

/// A named download strategy: an ordered argument list for the external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    label: String,
    args: Vec<Arg>,
    capture: bool,
}

impl Preset {
    pub fn new(label: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            label: label.into(),
            args,
            capture: false,
        }
    }

    /// Mark this preset as printing its result on stdout (`--get-url`, `--dump-json`)
    pub fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn captures_output(&self) -> bool {
        self.capture
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a.flag == flag)
    }

    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.flag == flag)
            .and_then(|a| a.value.as_deref())
    }

    /// Flatten the pairs into process arguments
    pub fn to_command_args(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len() * 2);
        for arg in &self.args {
            out.push(arg.flag.clone());
            if let Some(value) = &arg.value {
                out.push(value.clone());
            }
        }
        out
    }

    /// New preset: this one's arguments with `overrides` applied.
    ///
    /// A flag already present is replaced in place (first occurrence), any
    /// other flag is appended. Repeatable flags such as `--add-header` are
    /// always appended.
    pub fn with_overrides(&self, label: impl Into<String>, overrides: &[Arg]) -> Self {
        let mut args = self.args.clone();
        for arg in overrides {
            let repeatable = arg.flag == "--add-header";
            match args.iter_mut().find(|a| a.flag == arg.flag) {
                Some(existing) if !repeatable => *existing = arg.clone(),
                _ => args.push(arg.clone()),
            }
        }
        Self {
            label: label.into(),
            args,
            capture: self.capture,
        }
    }
}

/// Presets to try for one URL, highest expected fidelity first.
///
/// Always holds at least the base preset, in position 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetChain {
    presets: Vec<Preset>,
}

#[allow(clippy::len_without_is_empty)]
impl PresetChain {
    pub fn new(base: Preset) -> Self {
        Self {
            presets: vec![base],
        }
    }

    pub fn push(&mut self, preset: Preset) {
        self.presets.push(preset);
    }

    pub fn base(&self) -> &Preset {
        &self.presets[0]
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.presets.iter().map(Preset::label).collect()
    }
}

/// Outcome of one executor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub label: String,
    pub succeeded: bool,
    /// Stdout text, only for capturing presets
    pub output: Option<String>,
    pub failure: Option<AttemptFailure>,
}

impl AttemptResult {
    pub fn success(label: &str, output: Option<String>) -> Self {
        Self {
            label: label.to_string(),
            succeeded: true,
            output,
            failure: None,
        }
    }

    pub fn failed(label: &str, failure: AttemptFailure) -> Self {
        Self {
            label: label.to_string(),
            succeeded: false,
            output: None,
            failure: Some(failure),
        }
    }
}
