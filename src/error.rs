//! Error types for configuration and IO boundaries
//!
//! Numerical failures inside the model are never errors: they surface as
//! structured results (`IrrResult`, `OptimizationResult`) instead.

use thiserror::Error;

/// Validation failure carrying every finding in the order it was detected
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parameter validation failed: {}", .errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("unknown parameter name: {0}")]
    UnknownParameter(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not parse {field}: {value}")]
    Parse { field: String, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WindfinResult<T> = Result<T, ModelError>;
