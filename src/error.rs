//! Error types for the repair simulator.
//!
//! Each concern has its own enum; `Error` wraps them for callers that
//! just want one type.

use crate::assembly::ComponentId;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for all library operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// ASSEMBLY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("too many parts selected: {merged} parts, the assembly takes {allowed}")]
    SequenceOverflow { merged: usize, allowed: usize },

    #[error("parts are not in the required order: position {position} expects {expected}, got {found}")]
    SequenceMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("component {0} is not active")]
    NotFound(ComponentId),

    #[error("component {0} cannot be merged with itself")]
    SameComponent(ComponentId),

    #[error("part {0} is not in the catalog")]
    UnknownPart(i64),
}

/// Failure while picking parts from the catalog into a repair process.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("invalid granularity: {0:?} (expected daily, weekly, monthly, quarterly or yearly)")]
    InvalidGranularity(String),
}

// ============================================================================
// STORAGE
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid part {id}: {reason}")]
    InvalidPart { id: i64, reason: String },

    #[error("invalid activity record: {0}")]
    InvalidRecord(String),
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

// ============================================================================
// OBSERVERS
// ============================================================================

/// Raised by an observer that could not handle a notification.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("observer {observer} failed: {message}")]
pub struct ObserverError {
    pub observer: String,
    pub message: String,
}

impl ObserverError {
    pub fn new(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_error_messages() {
        let err = AssemblyError::SequenceMismatch {
            position: 0,
            expected: "Body".to_string(),
            found: "Sensor".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parts are not in the required order: position 0 expects Body, got Sensor"
        );

        let err = AssemblyError::NotFound(ComponentId(7));
        assert_eq!(err.to_string(), "component #7 is not active");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = AggregationError::InvalidGranularity("hourly".into()).into();
        assert!(matches!(err, Error::Aggregation(_)));
        assert!(err.to_string().contains("hourly"));

        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
