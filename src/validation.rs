//! # Validation errors
//!
//! Entity checks (formula format, descriptor bounds, uniqueness in the compound guide,
//! consistency against the compound authority, CSV import) report problems as
//! `ValidationError`s carrying a short machine-readable code and a human readable
//! message. Several problems found in one pass are collected into `ValidationErrors`.
//!
//! ## Codes
//! | code | raised by |
//! |------|-----------|
//! | `mol_malform` | formula validator |
//! | `max_min_mix` | numeric/ordinal descriptor bounds |
//! | `invalid_heading` | descriptor heading |
//! | `wrong_type`, `out_of_range`, `not_permitted` | descriptor values |
//! | `no_csid`, `invalid_name`, `invalid_inchi`, `invalid_smiles`, `invalid_formula` | consistency check |
//! | `duplicate_abbrev`, `duplicate_csid`, `duplicate_reference` | collections |
//! | `csv_row` | compound CSV import |
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// a list of validation problems found in one pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// true if any collected error carries `code`
    pub fn has_code(&self, code: &str) -> bool {
        self.0.iter().any(|e| e.code == code)
    }

    /// Ok(()) when nothing was collected, otherwise the whole list as an error
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
