//! Structured error types shared across seekscan crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SeekError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (indices, coordinates, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the seekscan engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SeekError {
    /// Circle fit impossible (collinear or otherwise degenerate input).
    #[error("degenerate geometry: {0}")]
    Geometry(ErrorInfo),
    /// Reconciliation could not find any overlapping hole observation.
    #[error("insufficient overlap: {0}")]
    Overlap(ErrorInfo),
    /// The instrument refused a commanded position or state.
    #[error("device rejected: {0}")]
    Device(ErrorInfo),
    /// The operator terminated the scan.
    #[error("operator abort: {0}")]
    Abort(ErrorInfo),
    /// Invalid scan or planning parameters.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Storage, I/O and serialization failures.
    #[error("persistence error: {0}")]
    Persistence(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl SeekError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SeekError::Geometry(info)
            | SeekError::Overlap(info)
            | SeekError::Device(info)
            | SeekError::Abort(info)
            | SeekError::Config(info)
            | SeekError::Persistence(info) => info,
        }
    }

    /// Shorthand for a rejected device command.
    pub fn device_rejected(code: &str, message: impl Into<String>) -> Self {
        SeekError::Device(ErrorInfo::new(code, message))
    }

    /// Shorthand for invalid configuration.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        SeekError::Config(ErrorInfo::new(code, message))
    }

    /// Shorthand for persistence failures carrying the offending path.
    pub fn persistence(code: &str, err: impl ToString, path: impl Display) -> Self {
        SeekError::Persistence(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.to_string()),
        )
    }

    /// True for the errors the scan executor converts into a skip.
    pub fn is_device_rejection(&self) -> bool {
        matches!(self, SeekError::Device(_))
    }
}
