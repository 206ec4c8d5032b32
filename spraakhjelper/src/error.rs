use common::models::{FieldError, Provider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid input: {}", describe(.0))]
    Validation(Vec<FieldError>),
    #[error("{0} configuration missing, set {1}")]
    Configuration(Provider, &'static str),
    #[error("{provider} request failed: {message}")]
    Unavailable {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },
    #[error("empty response from {0}")]
    EmptyResponse(Provider),
    #[error("malformed oracle response: {0}")]
    Malformed(String),
    #[error("failed to render prompt: {0}")]
    Prompt(#[from] askama::Error),
}

impl OracleError {
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Validation(_) => "validation",
            OracleError::Configuration(..) => "configuration",
            OracleError::Unavailable { .. } => "oracle_unavailable",
            OracleError::EmptyResponse(_) => "empty_response",
            OracleError::Malformed(_) => "malformed_response",
            OracleError::Prompt(_) => "prompt",
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fails with [`OracleError::Validation`] for every blank field.
pub fn require_non_empty(fields: &[(&str, &str)]) -> Result<(), OracleError> {
    let errors: Vec<FieldError> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError {
            field: field.to_string(),
            message: format!("{field} is required"),
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(OracleError::Validation(errors))
    }
}
