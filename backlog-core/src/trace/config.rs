//! Tracer configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BacklogError, Result};
use crate::{DEFAULT_BACKLOG_CAPACITY, DEFAULT_BACKLOG_SIZE};

/// What to do when an exchange cannot be snapshotted
///
/// The exchange always continues down the route; this only decides how
/// visible the lost trace event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CaptureFailurePolicy {
    /// Drop the event silently
    Ignore = 0,
    /// Drop the event and count it
    Count = 1,
    /// Drop the event, count it and emit a warning
    #[default]
    Log = 2,
}

impl CaptureFailurePolicy {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CaptureFailurePolicy::Ignore,
            1 => CaptureFailurePolicy::Count,
            _ => CaptureFailurePolicy::Log,
        }
    }
}

/// Configuration for a backlog tracer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Maximum events held in the backlog across all nodes
    pub capacity: usize,

    /// How many of the latest events per node to report as current
    pub backlog_size: usize,

    /// Whether capture starts enabled
    pub enabled: bool,

    /// Handling of snapshot failures
    pub capture_failure_policy: CaptureFailurePolicy,

    /// Clip captured bodies to this many characters (0 = unlimited)
    pub body_max_chars: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BACKLOG_CAPACITY,
            backlog_size: DEFAULT_BACKLOG_SIZE,
            enabled: false,
            capture_failure_policy: CaptureFailurePolicy::default(),
            body_max_chars: 0,
        }
    }
}

impl TracerConfig {
    /// Set the backlog capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the per-node backlog size
    pub fn backlog_size(mut self, size: usize) -> Self {
        self.backlog_size = size;
        self
    }

    /// Start with capture enabled or disabled
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the capture failure policy
    pub fn capture_failure_policy(mut self, policy: CaptureFailurePolicy) -> Self {
        self.capture_failure_policy = policy;
        self
    }

    /// Set the body clipping limit
    pub fn body_max_chars(mut self, max_chars: usize) -> Self {
        self.body_max_chars = max_chars;
        self
    }

    /// Check the configuration for values the tracer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(BacklogError::InvalidConfig {
                reason: "capacity must be a positive number".to_string(),
            });
        }
        if self.backlog_size == 0 {
            return Err(BacklogError::InvalidConfig {
                reason: "backlog_size must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TracerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BacklogError::IoError {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TracerConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.backlog_size, 10);
        assert!(!config.enabled);
        assert_eq!(config.capture_failure_policy, CaptureFailurePolicy::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = TracerConfig::from_json(
            r#"{"enabled": true, "capacity": 50, "capture_failure_policy": "count"}"#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.capacity, 50);
        assert_eq!(config.backlog_size, 10);
        assert_eq!(config.capture_failure_policy, CaptureFailurePolicy::Count);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = TracerConfig::from_json(r#"{"capacity": 0}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = TracerConfig::default().backlog_size(0).validate().unwrap_err();
        assert!(err.to_string().contains("backlog_size"));

        let err = TracerConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");
    }

    #[test]
    fn test_policy_from_u8() {
        for policy in [
            CaptureFailurePolicy::Ignore,
            CaptureFailurePolicy::Count,
            CaptureFailurePolicy::Log,
        ] {
            assert_eq!(CaptureFailurePolicy::from_u8(policy as u8), policy);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = TracerConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
