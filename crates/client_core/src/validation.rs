//! Pure pre-flight checks run before any network call.

use shared::{
    domain::{FormField, RegistrationForm, UploadResult, ValidatedRegistration, WalletAddress},
    error::ValidationError,
};

const REQUIRED_FIELDS: [FormField; 3] = [
    FormField::Name,
    FormField::WalletAddress,
    FormField::Position,
];

/// Checks completeness, then address shape, then the pinned image, and
/// reports only the first failure.
pub fn validate(
    form: &RegistrationForm,
    upload: &UploadResult,
) -> Result<ValidatedRegistration, ValidationError> {
    if let Some(field) = first_missing_field(form) {
        return Err(ValidationError::MissingField { field });
    }

    // The address is checked exactly as entered; padding is not a valid address.
    let wallet_address = WalletAddress::parse(&form.wallet_address)?;

    let content_uri = upload
        .content_uri
        .as_deref()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .ok_or(ValidationError::MissingImage)?;

    Ok(ValidatedRegistration {
        name: form.name.trim().to_string(),
        wallet_address,
        position: form.position.trim().to_string(),
        content_uri: content_uri.to_string(),
    })
}

pub fn first_missing_field(form: &RegistrationForm) -> Option<FormField> {
    REQUIRED_FIELDS
        .into_iter()
        .find(|field| form.field(*field).trim().is_empty())
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
