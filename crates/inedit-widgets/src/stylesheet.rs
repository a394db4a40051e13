#![forbid(unsafe_code)]

//! StyleSheet registry mapping class names to terminal styles.
//!
//! Fields only produce class names; hosts resolve them here.
//!
//! # Example
//! ```
//! use crossterm::style::{Attribute, Color, ContentStyle};
//! use inedit_widgets::{ClassList, StyleSheet};
//!
//! let sheet = StyleSheet::new();
//! let mut bold = ContentStyle::new();
//! bold.attributes.set(Attribute::Bold);
//! sheet.define("title", bold);
//!
//! let mut red = ContentStyle::new();
//! red.foreground_color = Some(Color::Red);
//! sheet.define("alert", red);
//!
//! let style = sheet.compose(&ClassList::new().with("title alert"));
//! assert_eq!(style.foreground_color, Some(Color::Red));
//! assert!(style.attributes.has(Attribute::Bold));
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crossterm::style::{Attribute, Color, ContentStyle};

use crate::editable::presentation::ClassList;

/// A registry of named styles.
///
/// Uses an internal `RwLock` so a sheet can be shared by reference between a
/// model and its view.
#[derive(Debug, Default)]
pub struct StyleSheet {
    styles: RwLock<HashMap<String, ContentStyle>>,
}

impl StyleSheet {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self {
            styles: RwLock::new(HashMap::new()),
        }
    }

    /// Sheet with styles for the default field classes:
    /// - `field`: underlined
    /// - `field-editing`: reversed
    /// - `field-loading`: dim grey
    /// - `field-invalid`: red on dark red, bold
    #[must_use]
    pub fn with_defaults() -> Self {
        let sheet = Self::new();

        sheet.define("field", with_attrs(ContentStyle::new(), &[Attribute::Underlined]));
        sheet.define(
            "field-editing",
            with_attrs(ContentStyle::new(), &[Attribute::Reverse]),
        );

        let mut loading = with_attrs(ContentStyle::new(), &[Attribute::Dim]);
        loading.foreground_color = Some(Color::Grey);
        sheet.define("field-loading", loading);

        let mut invalid = with_attrs(ContentStyle::new(), &[Attribute::Bold]);
        invalid.foreground_color = Some(Color::Red);
        invalid.background_color = Some(Color::DarkRed);
        sheet.define("field-invalid", invalid);

        sheet
    }

    /// Define or replace a named style.
    pub fn define(&self, name: impl Into<String>, style: ContentStyle) {
        let mut styles = self.styles.write().unwrap_or_else(PoisonError::into_inner);
        styles.insert(name.into(), style);
    }

    /// Look up a named style.
    pub fn get(&self, name: &str) -> Option<ContentStyle> {
        let styles = self.styles.read().unwrap_or_else(PoisonError::into_inner);
        styles.get(name).copied()
    }

    /// Whether `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        let styles = self.styles.read().unwrap_or_else(PoisonError::into_inner);
        styles.contains_key(name)
    }

    /// Number of defined styles.
    pub fn len(&self) -> usize {
        let styles = self.styles.read().unwrap_or_else(PoisonError::into_inner);
        styles.len()
    }

    /// Whether no styles are defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge the styles of `classes` left to right.
    ///
    /// Later colors win; attributes accumulate. Unknown names are skipped.
    pub fn compose(&self, classes: &ClassList) -> ContentStyle {
        let styles = self.styles.read().unwrap_or_else(PoisonError::into_inner);
        let mut result = ContentStyle::new();
        for name in classes.iter() {
            if let Some(style) = styles.get(name) {
                result = merge(result, style);
            }
        }
        result
    }
}

impl Clone for StyleSheet {
    fn clone(&self) -> Self {
        let styles = self.styles.read().unwrap_or_else(PoisonError::into_inner);
        Self {
            styles: RwLock::new(styles.clone()),
        }
    }
}

fn with_attrs(mut style: ContentStyle, attrs: &[Attribute]) -> ContentStyle {
    for attr in attrs {
        style.attributes.set(*attr);
    }
    style
}

fn merge(mut base: ContentStyle, over: &ContentStyle) -> ContentStyle {
    if over.foreground_color.is_some() {
        base.foreground_color = over.foreground_color;
    }
    if over.background_color.is_some() {
        base.background_color = over.background_color;
    }
    if over.underline_color.is_some() {
        base.underline_color = over.underline_color;
    }
    base.attributes.extend(over.attributes);
    base
}
