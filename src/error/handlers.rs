//! Error handlers
//!
//! Maps errors onto HTTP status codes and logs them.

use crate::error::types::{FileManagerError, GuardError, MutateError};
use axum::http::StatusCode;
use log::{error, warn};

/// Log a file manager error at a level matching its severity
pub fn handle_error(err: &FileManagerError) {
    match err {
        FileManagerError::Guard(_) => warn!("Request rejected: {}", err),
        FileManagerError::Mutate(MutateError::NotFound(_)) => warn!("{}", err),
        _ => error!("File manager error: {}", err),
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &FileManagerError) -> StatusCode {
    match err {
        FileManagerError::Guard(GuardError::PathRejected(_)) => StatusCode::BAD_REQUEST,
        FileManagerError::Guard(GuardError::NotFound(_)) => StatusCode::NOT_FOUND,
        FileManagerError::Guard(GuardError::InvalidRoot(..)) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::List(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::Mutate(MutateError::NotFound(_)) => StatusCode::NOT_FOUND,
        FileManagerError::Mutate(MutateError::Rejected(_)) => StatusCode::BAD_REQUEST,
        FileManagerError::Mutate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::Archive(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FileManagerError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
