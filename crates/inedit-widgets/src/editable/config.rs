#![forbid(unsafe_code)]

//! Field configuration.
//!
//! Class names and input attributes are opaque to the field: they are passed
//! through to presentation and the draft input untouched, apart from the
//! checks in [`FieldConfig::validate`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Class names added on top of the base class per state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FieldClasses {
    /// Always present, in every state.
    pub base: String,
    /// Added while editing.
    pub editing: String,
    /// Added while a commit is in flight.
    pub loading: String,
    /// Added for the one frame after a rejected commit.
    pub invalid: String,
}

impl Default for FieldClasses {
    fn default() -> Self {
        Self {
            base: "field".to_string(),
            editing: "field-editing".to_string(),
            loading: "field-loading".to_string(),
            invalid: "field-invalid".to_string(),
        }
    }
}

/// Attributes forwarded to the draft input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputAttrs {
    /// Shown dimmed when the draft is empty.
    pub placeholder: Option<String>,
    /// Grapheme limit for typing and pasting.
    pub max_length: Option<usize>,
    /// Draw every grapheme as this character.
    pub mask: Option<char>,
}

/// Presentation and input configuration of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FieldConfig {
    /// State class names.
    pub classes: FieldClasses,
    /// Input attributes.
    pub input: InputAttrs,
    /// Shown in the display element when the committed value is empty.
    pub empty_text: Option<String>,
}

impl FieldConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base class.
    #[must_use]
    pub fn base_class(mut self, class: impl Into<String>) -> Self {
        self.classes.base = class.into();
        self
    }

    /// Set the class added while editing.
    #[must_use]
    pub fn editing_class(mut self, class: impl Into<String>) -> Self {
        self.classes.editing = class.into();
        self
    }

    /// Set the class added while committing.
    #[must_use]
    pub fn loading_class(mut self, class: impl Into<String>) -> Self {
        self.classes.loading = class.into();
        self
    }

    /// Set the class added after a rejected commit.
    #[must_use]
    pub fn invalid_class(mut self, class: impl Into<String>) -> Self {
        self.classes.invalid = class.into();
        self
    }

    /// Set the input placeholder.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.input.placeholder = Some(placeholder.into());
        self
    }

    /// Limit typed and pasted input to `max` graphemes.
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.input.max_length = Some(max);
        self
    }

    /// Mask the draft with `mask`.
    #[must_use]
    pub fn mask(mut self, mask: char) -> Self {
        self.input.mask = Some(mask);
        self
    }

    /// Text shown for an empty committed value.
    #[must_use]
    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = Some(text.into());
        self
    }

    /// Check the attributes the draft input cannot work with.
    ///
    /// # Errors
    ///
    /// [`FieldError::ZeroMaxLength`] for a zero length limit,
    /// [`FieldError::InvalidMask`] for a control or whitespace mask and
    /// [`FieldError::InvalidClassName`] for a class name with whitespace.
    /// Empty class names are allowed and simply add nothing.
    pub fn validate(&self) -> Result<(), FieldError> {
        let classes = &self.classes;
        for name in [
            &classes.base,
            &classes.editing,
            &classes.loading,
            &classes.invalid,
        ] {
            if name.chars().any(char::is_whitespace) {
                return Err(FieldError::InvalidClassName(name.clone()));
            }
        }
        if self.input.max_length == Some(0) {
            return Err(FieldError::ZeroMaxLength);
        }
        if let Some(mask) = self.input.mask
            && (mask.is_control() || mask.is_whitespace())
        {
            return Err(FieldError::InvalidMask(mask));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_field_prefix() {
        let cfg = FieldConfig::default();
        assert_eq!(cfg.classes.base, "field");
        assert_eq!(cfg.classes.loading, "field-loading");
        assert_eq!(cfg.classes.invalid, "field-invalid");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = FieldConfig::new()
            .base_class("title")
            .loading_class("busy")
            .placeholder("Room name")
            .max_length(32);
        assert_eq!(cfg.classes.base, "title");
        assert_eq!(cfg.classes.loading, "busy");
        assert_eq!(cfg.input.placeholder.as_deref(), Some("Room name"));
        assert_eq!(cfg.input.max_length, Some(32));
    }

    #[test]
    fn validate_rejects_unusable_input() {
        assert_eq!(
            FieldConfig::new().max_length(0).validate(),
            Err(FieldError::ZeroMaxLength)
        );
        assert_eq!(
            FieldConfig::new().mask(' ').validate(),
            Err(FieldError::InvalidMask(' '))
        );
        assert!(FieldConfig::new().mask('*').validate().is_ok());
        assert_eq!(
            FieldConfig::new().loading_class("is loading").validate(),
            Err(FieldError::InvalidClassName("is loading".into()))
        );
        assert!(FieldConfig::new().invalid_class("").validate().is_ok());
    }
}
