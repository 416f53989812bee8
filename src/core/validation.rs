//! Query validation at the form boundary.
//!
//! `Query` can only be built through [`Query::parse`], so anything the
//! session receives has already passed validation.

use std::fmt;

/// Minimum query length in characters.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    TooShort { min: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooShort { min } => {
                write!(f, "Query must have at least {min} characters.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl Query {
    /// Trims surrounding whitespace and enforces the minimum length.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Err(ValidationError::TooShort {
                min: MIN_QUERY_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
