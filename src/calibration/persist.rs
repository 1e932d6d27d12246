//! Persisted per-unit calibration file
//!
//! One `key: value` pair per line. Keys and values are trimmed of spaces and
//! tabs, blank lines and lines starting with `#` are skipped. Values are
//! whitespace separated scalars.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{VibratorError, VibratorResult};

/// Parsed calibration file
#[derive(Debug, Clone, Default)]
pub struct PersistData {
    path: Option<PathBuf>,
    lines: Vec<String>,
    entries: BTreeMap<String, String>,
}

fn trim(text: &str) -> &str {
    text.trim_matches(|c| c == ' ' || c == '\t')
}

impl PersistData {
    pub fn open(path: impl AsRef<Path>) -> VibratorResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            VibratorError::ConfigurationMissing(format!("{}: {}", path.display(), e))
        })?;
        let mut data = Self::parse(&contents);
        data.path = Some(path.to_path_buf());
        Ok(data)
    }

    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in contents.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                entries.insert(trim(key).to_string(), trim(value).to_string());
            }
        }
        Self {
            path: None,
            lines: contents.lines().map(str::to_string).collect(),
            entries,
        }
    }

    fn raw(&self, key: &str) -> Option<&str> {
        let value = self.entries.get(key).map(String::as_str);
        if value.is_none() {
            debug!("Missing {} config", key);
        }
        value
    }

    /// Whole value as text
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.raw(key).map(str::to_string)
    }

    /// Single scalar. Trailing tokens make the value invalid.
    pub fn get<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.raw(key)?;
        let parsed = raw.parse().ok();
        if parsed.is_none() {
            warn!("Invalid {} config: '{}'", key, raw);
        }
        parsed
    }

    /// Exactly `N` whitespace separated scalars
    pub fn get_array<T: FromStr, const N: usize>(&self, key: &str) -> Option<[T; N]> {
        let raw = self.raw(key)?;
        let values: Option<Vec<T>> = raw.split_whitespace().map(|token| token.parse().ok()).collect();
        let parsed = values.and_then(|values| <[T; N]>::try_from(values).ok());
        if parsed.is_none() {
            warn!("Invalid {} config: expected {} values, got '{}'", key, N, raw);
        }
        parsed
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File contents as read, for diagnostics
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
