#![forbid(unsafe_code)]

//! State to presentation mapping.
//!
//! [`present`] is a pure function of the field state. It decides which
//! element is shown and which classes it carries; drawing is left to the
//! host.

use std::fmt;

use super::config::FieldConfig;
use super::machine::EditState;

/// Ordered set of class names.
///
/// Adding is the only mutation. Names are split on whitespace, empty names
/// are skipped and duplicates are kept once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one or more whitespace-separated names.
    pub fn add(&mut self, names: &str) {
        for name in names.split_whitespace() {
            if !self.contains(name) {
                self.names.push(name.to_string());
            }
        }
    }

    /// Builder form of [`ClassList::add`].
    #[must_use]
    pub fn with(mut self, names: &str) -> Self {
        self.add(names);
        self
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// What the host should show for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision<'a> {
    /// Static display of the committed value.
    Display {
        /// Text to show (the committed value or the configured empty text).
        text: &'a str,
        /// Classes on the display element.
        classes: ClassList,
    },
    /// Text input bound to the draft.
    Input {
        /// Current draft.
        draft: &'a str,
        /// Classes on the input element.
        classes: ClassList,
        /// Placeholder forwarded from configuration.
        placeholder: Option<&'a str>,
        /// `false` while committing: the input is shown but takes no edits.
        interactive: bool,
    },
}

impl RenderDecision<'_> {
    /// Classes of the chosen element.
    pub fn classes(&self) -> &ClassList {
        match self {
            Self::Display { classes, .. } | Self::Input { classes, .. } => classes,
        }
    }

    /// Whether the input element is shown.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

/// Map a state to its presentation.
///
/// | state      | element | classes added to base |
/// |------------|---------|-----------------------|
/// | Viewing    | display | none                  |
/// | Editing    | input   | editing               |
/// | Committing | input   | loading               |
/// | Invalid    | display | invalid               |
pub fn present<'a>(
    state: &'a EditState,
    committed: &'a str,
    config: &'a FieldConfig,
) -> RenderDecision<'a> {
    let classes = ClassList::new().with(&config.classes.base);
    let placeholder = config.input.placeholder.as_deref();
    let display_text = if committed.is_empty() {
        config.empty_text.as_deref().unwrap_or(committed)
    } else {
        committed
    };

    match state {
        EditState::Viewing => RenderDecision::Display {
            text: display_text,
            classes,
        },
        EditState::Editing { draft } => RenderDecision::Input {
            draft,
            classes: classes.with(&config.classes.editing),
            placeholder,
            interactive: true,
        },
        EditState::Committing { draft, .. } => RenderDecision::Input {
            draft,
            classes: classes.with(&config.classes.loading),
            placeholder,
            interactive: false,
        },
        EditState::Invalid => RenderDecision::Display {
            text: display_text,
            classes: classes.with(&config.classes.invalid),
        },
    }
}
