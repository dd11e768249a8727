use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NfcError {
    #[error("failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid detector config: {0}")]
    InvalidConfig(String),

    #[error("debug output failed: {0}")]
    DebugOutput(String),

    #[error("pipeline step {step} needs {missing}")]
    StepOrder { step: String, missing: &'static str },
}

pub type Result<T> = std::result::Result<T, NfcError>;
