//! Internal helpers for validation and conversion.
//!
//! These utilities are not part of the public API.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Trims `value` and rejects it when empty.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `None` keeps the stored value; `Some` replaces it, blank clears it.
pub(crate) fn apply_optional_text_patch(
    existing: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        None => existing,
        Some(value) => normalize_optional_text(Some(value)),
    }
}

/// Canonical email form: trimmed, NFKC-normalized, lower-cased.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email: String = value.trim().nfkc().collect::<String>().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(EngineError::Validation("email is not valid".to_string()));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(EngineError::Validation("email is not valid".to_string()));
    }
    Ok(email)
}
