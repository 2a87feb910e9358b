use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FormField;

/// Client-side form checks, reported one at a time in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("missing required field: {}", field.label())]
    MissingField { field: FormField },
    #[error("wallet address must be 0x followed by 40 hex digits")]
    InvalidAddressFormat,
    #[error("no profile image has been uploaded")]
    MissingImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadError {
    #[error("image is {size_bytes} bytes, limit is {limit_bytes}")]
    FileTooLarge { size_bytes: usize, limit_bytes: usize },
    #[error("unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },
    #[error("image upload failed: {reason}")]
    UploadFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("transaction failed: {reason}")]
    TransactionFailed { reason: String },
    #[error("contract client broke its contract: {detail}")]
    MalformedCollaboratorResponse { detail: String },
}

impl RegistrationError {
    /// Whether the user can fix this by editing the form or retrying the submit.
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(self, RegistrationError::MalformedCollaboratorResponse { .. })
    }
}
