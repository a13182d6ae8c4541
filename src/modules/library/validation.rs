//! Request validation run at the HTTP boundary, before any domain value exists.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::models::{NewBook, NewBorrower};

/// RFC 5322 dot-atom local part, one `@`, and a dotted domain whose labels
/// do not start or end with a hyphen.
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    let atext = r"[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+";
    let label = r"[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?";
    Regex::new(&format!(
        r"^{atext}(?:\.{atext})*@{label}(?:\.{label})+$"
    ))
    .expect("email pattern compiles")
});

const EMAIL_MAX_LEN: usize = 254;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }

    fn indexed(self, index: usize) -> Self {
        Self {
            field: format!("[{index}].{}", self.field),
            error: self.error,
        }
    }
}

/// Trimmed `value`, recording an error when it is blank.
pub fn required(field: &str, value: &str, errors: &mut Vec<FieldError>) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
    }
    value.to_string()
}

/// Trimmed `value`, recording an error unless it is a plausible address.
pub fn email(field: &str, value: &str, errors: &mut Vec<FieldError>) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
    } else if value.len() > EMAIL_MAX_LEN || !EMAIL.is_match(value) {
        errors.push(FieldError::new(field, "must be a well-formed email address"));
    }
    value.to_string()
}

/// Body of `POST /borrowers`. Missing and `null` fields read as blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BorrowerPayload {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl BorrowerPayload {
    pub fn validate(self) -> Result<NewBorrower, Vec<FieldError>> {
        NewBorrower::new(
            self.name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default(),
        )
    }
}

/// Body of `POST /books` and one element of `POST /books/bulk`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookPayload {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookPayload {
    pub fn validate(self) -> Result<NewBook, Vec<FieldError>> {
        NewBook::new(
            self.isbn.as_deref().unwrap_or_default(),
            self.title.as_deref().unwrap_or_default(),
            self.author.as_deref().unwrap_or_default(),
        )
    }
}

/// Validates a whole batch; errors from every element are reported, indexed.
pub fn validate_books(payloads: Vec<BookPayload>) -> Result<Vec<NewBook>, Vec<FieldError>> {
    let mut drafts = Vec::with_capacity(payloads.len());
    let mut errors = Vec::new();

    for (index, payload) in payloads.into_iter().enumerate() {
        match payload.validate() {
            Ok(draft) => drafts.push(draft),
            Err(found) => errors.extend(found.into_iter().map(|e| e.indexed(index))),
        }
    }

    if errors.is_empty() {
        Ok(drafts)
    } else {
        Err(errors)
    }
}
