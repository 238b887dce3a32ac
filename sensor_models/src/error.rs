//! Sensor model error types

use thiserror::Error;

/// Errors raised by sensor construction and measurement generation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Invalid construction parameters
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Query timestamp is earlier than the stored dwell-centre timestamp
    #[error("Timestamp {query}s precedes dwell centre timestamp {stored}s")]
    Sequence { query: f64, stored: f64 },

    /// State, offset or mapping sizes disagree
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    Dimension {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl SensorError {
    pub fn config(msg: impl Into<String>) -> Self {
        SensorError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SensorError>;

/// Reject non-positive or non-finite parameters.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SensorError::config(format!("{name} must be positive, got {value}")))
    }
}

pub(crate) fn ensure_len(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SensorError::Dimension {
            context,
            expected,
            actual,
        })
    }
}
