use std::path::PathBuf;

use thiserror::Error;

use crate::triage::OfferValidationError;

#[derive(Debug, Error)]
pub enum FleetlineError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid location fix on line {line}: {message}")]
    Fix { line: usize, message: String },

    #[error("unsupported image type: {0}")]
    ImageType(PathBuf),

    #[error("invalid offer: {0}")]
    Validation(#[from] OfferValidationError),
}
