//! Error types for signature-script construction and verification

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SigScriptError {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid input reference: {0}")]
    InvalidReference(String),

    #[error("Malformed script: {0}")]
    MalformedScript(String),

    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    #[error("Script evaluation failed: {0}")]
    ScriptEvaluationFailed(String),
}

pub type Result<T> = std::result::Result<T, SigScriptError>;
