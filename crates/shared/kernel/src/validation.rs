//! Input guards for request payloads.
//!
//! Every guard trims its input and returns the normalized value, so handlers store exactly what
//! was validated.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const MAX_EMAIL_CHARS: usize = 254;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]{2,}$").expect("e-mail regex is valid")
});

// +2348031234567, 2348031234567 or 08031234567
static NG_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?234|0)([789]\d{9})$").expect("phone regex is valid"));

#[wayfare_derive::wayfare_error]
pub enum ValidationError {
    #[error("{field}: {message}")]
    Invalid { field: Cow<'static, str>, message: Cow<'static, str> },
}

impl ValidationError {
    pub fn invalid(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Invalid { field: field.into(), message: message.into() }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Invalid { field, .. } => field,
        }
    }
}

/// Trims `value` and checks it is non-blank and at most `max_chars` characters.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::invalid(field, "must not be blank"));
    }
    if value.chars().count() > max_chars {
        return Err(ValidationError::invalid(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(value.to_owned())
}

/// Like [`required_text`], but blank or missing input yields `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required_text(field, value, max_chars).map(Some),
    }
}

/// Checks the shape of an e-mail address and lowercases it.
pub fn email(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim().to_lowercase();
    if value.len() > MAX_EMAIL_CHARS || !EMAIL.is_match(&value) {
        return Err(ValidationError::invalid(field, "must be a valid e-mail address"));
    }
    Ok(value)
}

/// Validates a Nigerian mobile number and normalizes it to `+234XXXXXXXXXX`.
///
/// Spaces, dashes, dots and parentheses are ignored.
pub fn nigerian_phone(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let compact: String =
        value.chars().filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')')).collect();

    NG_PHONE
        .captures(&compact)
        .and_then(|captures| captures.get(1))
        .map(|subscriber| format!("+234{}", subscriber.as_str()))
        .ok_or_else(|| ValidationError::invalid(field, "must be a Nigerian mobile number"))
}

/// Optional variant of [`nigerian_phone`]; blank input yields `None`.
pub fn optional_nigerian_phone(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => nigerian_phone(field, value).map(Some),
    }
}
