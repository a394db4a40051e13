#![forbid(unsafe_code)]

//! Construction-time errors.
//!
//! Everything that can go wrong at runtime resolves inside the field; these
//! are contract violations caught when a field is built.

use std::fmt;

/// A field could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field key is empty or only whitespace.
    EmptyKey,
    /// `max_length` was set to zero, which would make the input uneditable.
    ZeroMaxLength,
    /// The mask character is a control or whitespace character.
    InvalidMask(char),
    /// A class name contains whitespace.
    InvalidClassName(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "field key must not be empty"),
            Self::ZeroMaxLength => write!(f, "max_length must be at least 1"),
            Self::InvalidMask(c) => write!(f, "invalid mask character {c:?}"),
            Self::InvalidClassName(name) => {
                write!(f, "class name {name:?} must not contain whitespace")
            }
        }
    }
}

impl std::error::Error for FieldError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(FieldError::EmptyKey.to_string(), "field key must not be empty");
        assert_eq!(
            FieldError::ZeroMaxLength.to_string(),
            "max_length must be at least 1"
        );
        assert!(FieldError::InvalidMask('\n').to_string().contains("'\\n'"));
        assert_eq!(
            FieldError::InvalidClassName("a b".into()).to_string(),
            "class name \"a b\" must not contain whitespace"
        );
    }
}
