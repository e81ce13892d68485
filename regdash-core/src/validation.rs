//! Form field validation
//!
//! Rules run before any network call. Each field reports at most one error:
//! the first rule (in declaration order) it fails.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static LETTERS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\s]+$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

/// Validation error for one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: String },

    /// Field exceeds maximum length
    TooLong { field: String, max: usize },

    /// Value doesn't match the required format
    InvalidFormat { field: String, reason: &'static str },

    /// Value is not one of the declared options
    InvalidVariant { field: String, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} is required", field),
            Self::TooLong { field, max } => {
                write!(f, "{} cannot be longer than {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A single check applied to the text of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    /// ASCII digits only
    Digits,
    /// At most this many characters
    MaxLen(usize),
    /// Letters (any script) and whitespace only
    Letters,
    Email,
}

impl Rule {
    /// Check `text` against this rule; `label` names the field in messages.
    pub fn check(&self, label: &str, text: &str) -> Result<(), ValidationError> {
        let format = |ok: bool, reason: &'static str| {
            if ok {
                Ok(())
            } else {
                Err(ValidationError::InvalidFormat {
                    field: label.to_string(),
                    reason,
                })
            }
        };

        match self {
            Rule::Required if text.trim().is_empty() => Err(ValidationError::Empty {
                field: label.to_string(),
            }),
            Rule::Required => Ok(()),
            Rule::MaxLen(max) if text.chars().count() > *max => Err(ValidationError::TooLong {
                field: label.to_string(),
                max: *max,
            }),
            Rule::MaxLen(_) => Ok(()),
            Rule::Digits => format(DIGITS_RE.is_match(text), "only digits are allowed"),
            Rule::Letters => format(
                LETTERS_RE.is_match(text),
                "only letters and spaces are allowed",
            ),
            Rule::Email => format(EMAIL_RE.is_match(text), "enter a valid email address"),
        }
    }
}

/// Errors keyed by field name, in field-name order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, ValidationError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error for a field. The first error per field wins.
    pub fn insert(&mut self, field: impl Into<String>, error: ValidationError) {
        self.errors.entry(field.into()).or_insert(error);
    }

    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `Ok(())` when no field failed
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::error::DashError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.values().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}
