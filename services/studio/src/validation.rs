//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Largest thumbnail image accepted for upload (2 MiB)
pub const MAX_THUMBNAIL_BYTES: usize = 2 * 1024 * 1024;

/// Title length limit of the edit form
pub const MAX_TITLE_CHARS: usize = 100;

/// Description length limit of the edit form
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Validation failures; none of them mutate any state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an image file (JPG, PNG, or GIF), got {mime_type}")]
    NotAnImage { mime_type: String },

    #[error("Image size must be less than 2MB, got {size} bytes")]
    TooLarge { size: usize },

    #[error("{field} must be at most {max} characters long")]
    TooLong { field: &'static str, max: usize },

    #[error("{0}")]
    Invalid(String),
}

/// Validate a thumbnail image before it is previewed or uploaded
pub fn validate_thumbnail(mime_type: &str, size: usize) -> Result<(), ValidationError> {
    if !mime_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage {
            mime_type: mime_type.to_string(),
        });
    }

    if size > MAX_THUMBNAIL_BYTES {
        return Err(ValidationError::TooLarge { size });
    }

    Ok(())
}

/// Validate the character budget of a form field
pub fn validate_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(())
}

/// Validate a collaborator email
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Invalid("Email is required".to_string()));
    }

    if email.len() > 254 {
        return Err(ValidationError::Invalid(
            "Email must be at most 254 characters long".to_string(),
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::Invalid("Invalid email format".to_string()));
    }

    Ok(())
}
