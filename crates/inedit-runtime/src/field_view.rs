#![forbid(unsafe_code)]

//! Drawing an [`EditableField`] into a [`Frame`].
//!
//! The field decides what to show ([`RenderDecision`]); this module turns
//! that into cells. Classes resolve through a [`StyleSheet`], the input is
//! windowed to the cell width, and the field registers a hit region under
//! its id so the host can route clicks back to it.

use crossterm::style::{Attribute, ContentStyle};
use inedit_widgets::{EditableField, RenderDecision, StyleSheet};

use crate::frame::{Frame, HitRegion};

/// Where to draw a field: one row, `width` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldArea {
    /// Left column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
}

impl FieldArea {
    /// Create an area.
    pub const fn new(x: u16, y: u16, width: u16) -> Self {
        Self { x, y, width }
    }

    /// Whether the cell `(x, y)` lies inside the area.
    pub fn contains(&self, x: u16, y: u16) -> bool {
        y == self.y && x >= self.x && u32::from(x) < u32::from(self.x) + u32::from(self.width)
    }
}

/// Draw `field` into `area`.
///
/// While the field is editing the frame cursor is placed in the input; while
/// committing the input is drawn without a cursor.
pub fn draw_field(frame: &mut Frame, area: FieldArea, field: &EditableField, sheet: &StyleSheet) {
    if area.width == 0 {
        return;
    }
    let decision = field.render();
    let style = sheet.compose(decision.classes());
    frame.set_style(area.x, area.y, area.width, style);
    frame.register_hit(HitRegion {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1,
        id: field.id().get(),
    });

    match decision {
        RenderDecision::Display { text, .. } => {
            frame.print_clipped(area.x, area.y, text, style, area.width);
        }
        RenderDecision::Input {
            draft,
            placeholder,
            interactive,
            ..
        } => {
            if draft.is_empty()
                && let Some(placeholder) = placeholder
            {
                let mut dim = style;
                dim.attributes.set(Attribute::Dim);
                frame.print_clipped(area.x, area.y, placeholder, dim, area.width);
                if interactive {
                    frame.set_cursor(Some((area.x, area.y)));
                }
                return;
            }

            let window = field.input().window(usize::from(area.width));
            frame.print_clipped(area.x, area.y, &window.text, style, area.width);
            if let Some((start, end)) = window.selection {
                let selected = toggled_reverse(style);
                frame.set_style(
                    area.x + start as u16,
                    area.y,
                    (end - start) as u16,
                    selected,
                );
            }
            if interactive {
                let col = area.x + (window.cursor_col as u16).min(area.width - 1);
                frame.set_cursor(Some((col, area.y)));
            }
        }
    }
}

fn toggled_reverse(mut style: ContentStyle) -> ContentStyle {
    style.attributes.toggle(Attribute::Reverse);
    style
}
