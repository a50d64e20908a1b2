//! Calculation error taxonomy shared by every model, optimizer and node.
//!
//! Input validation and degenerate-model failures are `CalcError`. Lookup
//! misses are never errors: callers get `None` instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the reservoir models and optimizers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{display} field '{field}' not found in message body")]
    MissingField { display: String, field: String },

    #[error("{display} field '{field}' must be a number")]
    NotNumeric { display: String, field: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: String, value: f64 },

    #[error("{name} cannot be negative, got {value}")]
    Negative { name: String, value: f64 },

    #[error("Target rate must be between 0 and initial rate (target={target}, initial={initial})")]
    InvalidTargetRate { target: f64, initial: f64 },

    #[error("Invalid Jones equation parameters (negative discriminant {discriminant:.4})")]
    NegativeDiscriminant { discriminant: f64 },

    #[error("Cannot calculate {quantity}: {term} = 0")]
    ZeroDenominator { quantity: String, term: String },

    #[error("Insufficient data for {what}: have {have}, need {need}")]
    InsufficientData {
        what: String,
        have: usize,
        need: usize,
    },

    #[error("{property} cannot be calculated with the {correlation} correlation")]
    Unsupported {
        property: String,
        correlation: String,
    },

    #[error("Cannot {action} a recommendation in status {status}")]
    InvalidTransition { action: String, status: String },

    #[error("{0}")]
    Invalid(String),
}

impl CalcError {
    pub fn missing(display: &str, field: &str) -> Self {
        Self::MissingField {
            display: display.to_string(),
            field: field.to_string(),
        }
    }

    pub fn non_positive(name: &str, value: f64) -> Self {
        Self::NonPositive {
            name: name.to_string(),
            value,
        }
    }

    pub fn negative(name: &str, value: f64) -> Self {
        Self::Negative {
            name: name.to_string(),
            value,
        }
    }

    pub fn out_of_range(name: &str, min: f64, max: f64, value: f64) -> Self {
        Self::OutOfRange {
            name: name.to_string(),
            min,
            max,
            value,
        }
    }

    /// Stable machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::NotNumeric { .. } => "NOT_NUMERIC",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::NonPositive { .. } => "NON_POSITIVE",
            Self::Negative { .. } => "NEGATIVE_VALUE",
            Self::InvalidTargetRate { .. } => "INVALID_TARGET_RATE",
            Self::NegativeDiscriminant { .. } => "NEGATIVE_DISCRIMINANT",
            Self::ZeroDenominator { .. } => "ZERO_DENOMINATOR",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::Unsupported { .. } => "UNSUPPORTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Invalid(_) => "INVALID_INPUT",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            code: self.code().to_string(),
        }
    }
}

/// Structured error body returned to API-style callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Require `value > 0`.
pub fn ensure_positive(name: &str, value: f64) -> Result<f64, CalcError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::non_positive(name, value))
    }
}

/// Require `value >= 0`.
pub fn ensure_non_negative(name: &str, value: f64) -> Result<f64, CalcError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::negative(name, value))
    }
}

/// Require `min <= value <= max`.
pub fn ensure_range(name: &str, value: f64, min: f64, max: f64) -> Result<f64, CalcError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(CalcError::out_of_range(name, min, max, value))
    }
}

/// Require `min < value <= max`.
pub fn ensure_range_above(name: &str, value: f64, min: f64, max: f64) -> Result<f64, CalcError> {
    if value > min && value <= max {
        Ok(value)
    } else {
        Err(CalcError::out_of_range(name, min, max, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_field() {
        let err = CalcError::missing("Initial Rate", "qi");
        assert_eq!(
            err.to_string(),
            "Initial Rate field 'qi' not found in message body"
        );
        assert_eq!(err.code(), "MISSING_FIELD");
    }

    #[test]
    fn test_error_body_carries_code() {
        let body = CalcError::non_positive("Bo", -1.0).to_body();
        assert_eq!(body.code, "NON_POSITIVE");
        assert!(body.error.contains("Bo must be positive"));
    }

    #[test]
    fn test_range_guards() {
        assert!(ensure_range("Porosity", 0.2, 0.0, 1.0).is_ok());
        assert!(ensure_range("Porosity", 1.2, 0.0, 1.0).is_err());
        assert!(ensure_range("Porosity", f64::NAN, 0.0, 1.0).is_err());
        assert!(ensure_positive("qi", 0.0).is_err());
        assert!(ensure_non_negative("t", 0.0).is_ok());
        assert!(ensure_range_above("Porosity", 0.0, 0.0, 1.0).is_err());
        assert!(ensure_range_above("Porosity", 1.0, 0.0, 1.0).is_ok());
    }
}
