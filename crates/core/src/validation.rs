//! Field-level validation rules shared by request DTOs.
//!
//! Request structs derive `validator::Validate` and point their custom
//! checks at the functions here. [`flatten_errors`] turns the resulting
//! `ValidationErrors` into the single message carried by
//! [`CoreError::Validation`](crate::error::CoreError::Validation).

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MAX_NAME_LENGTH: u64 = 255;
pub const MAX_DESCRIPTION_LENGTH: u64 = 2000;
pub const MAX_CHARACTER_DESCRIPTION_LENGTH: u64 = 5000;
pub const MAX_URL_LENGTH: u64 = 500;
pub const MAX_CONTENT_LENGTH: u64 = 100_000;
pub const MAX_SUMMARY_LENGTH: u64 = 2000;
pub const MAX_LABEL_LENGTH: u64 = 100;
pub const MAX_BRANCH_QUESTION_LENGTH: u64 = 500;
pub const MAX_TAG_NAME_LENGTH: u64 = 50;
pub const MAX_TYPE_LENGTH: u64 = 50;
pub const MAX_TRAIT_LENGTH: usize = 50;
pub const MAX_IMPORT_DESCRIPTION_LENGTH: u64 = 1000;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Tag categories
// ---------------------------------------------------------------------------

/// The closed set of tag categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Emotion,
    Event,
    Theme,
    Character,
    Location,
    Other,
}

impl TagCategory {
    pub const ALL: [TagCategory; 6] = [
        Self::Emotion,
        Self::Event,
        Self::Theme,
        Self::Character,
        Self::Location,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotion => "emotion",
            Self::Event => "event",
            Self::Theme => "theme",
            Self::Character => "character",
            Self::Location => "location",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Custom validators
// ---------------------------------------------------------------------------

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// `#RRGGBB`, case-insensitive.
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid(
            "hex_color",
            "must be a hex color like #1CB0F6".to_string(),
        ))
    }
}

pub fn validate_tag_category(value: &str) -> Result<(), ValidationError> {
    match TagCategory::parse(value) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "tag_category",
            "must be one of emotion, event, theme, character, location, other".to_string(),
        )),
    }
}

/// Every trait must be at most [`MAX_TRAIT_LENGTH`] characters.
pub fn validate_traits(traits: &[String]) -> Result<(), ValidationError> {
    match traits
        .iter()
        .position(|t| t.chars().count() > MAX_TRAIT_LENGTH)
    {
        Some(index) => Err(invalid(
            "trait_length",
            format!("trait {index} must not exceed {MAX_TRAIT_LENGTH} characters"),
        )),
        None => Ok(()),
    }
}

/// Reject names that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("blank", "must not be blank".to_string()))
    } else {
        Ok(())
    }
}

/// Validate that a password meets the minimum length.
pub fn validate_password_strength(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Error flattening
// ---------------------------------------------------------------------------

/// Render `ValidationErrors` as `field: message; field: message`, sorted by
/// field name so the output is stable.
pub fn flatten_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = match &e.message {
                    Some(m) => m.to_string(),
                    None => describe_code(e),
                };
                (field.clone(), message)
            })
        })
        .collect();
    parts.sort();
    parts
        .into_iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_code(err: &ValidationError) -> String {
    match err.code.as_ref() {
        "length" => match err.params.get("max") {
            Some(max) => format!("must not exceed {max} characters"),
            None => "has an invalid length".to_string(),
        },
        "required" => "is required".to_string(),
        "email" => "must be a valid email address".to_string(),
        other => format!("is invalid ({other})"),
    }
}
