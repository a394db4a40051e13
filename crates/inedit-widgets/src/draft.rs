#![forbid(unsafe_code)]

//! Draft input buffer.
//!
//! The live, single-line text buffer a field shows while editing. Cursor and
//! selection positions are grapheme indices, so combining marks and emoji
//! sequences move and delete as one unit.

use inedit_core::event::{Event, KeyCode, KeyEvent};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::editable::focus::FocusTarget;

/// A single-line, grapheme-aware edit buffer.
#[derive(Debug, Clone, Default)]
pub struct DraftInput {
    /// Text value.
    value: String,
    /// Cursor position (grapheme index).
    cursor: usize,
    /// Selection anchor (grapheme index). Selection spans anchor..cursor.
    selection_anchor: Option<usize>,
    /// Mask character for secret values.
    mask_char: Option<char>,
    /// Maximum length in graphemes (None = unlimited).
    max_length: Option<usize>,
    /// Whether the input holds keyboard focus.
    focused: bool,
}

/// Visible slice of a draft inside a fixed-width cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftWindow {
    /// Text to draw, already masked and clipped.
    pub text: String,
    /// Cursor column relative to the window start.
    pub cursor_col: usize,
    /// Selected columns `[start, end)` relative to the window start.
    pub selection: Option<(usize, usize)>,
}

impl DraftInput {
    /// Create an empty, unfocused buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mask character (builder).
    pub fn with_mask(mut self, mask: Option<char>) -> Self {
        self.mask_char = mask;
        self
    }

    /// Set the maximum length in graphemes (builder).
    pub fn with_max_length(mut self, max: Option<usize>) -> Self {
        self.max_length = max;
        self
    }

    /// Current text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text, placing the cursor at the end and clearing selection.
    ///
    /// Used when a field seeds its draft from the committed value. The
    /// length limit only applies to typing and pasting, never to values set
    /// here.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.grapheme_count();
        self.selection_anchor = None;
    }

    /// Replace the text as if it had been pasted over a full selection.
    ///
    /// Unlike [`set_value`](Self::set_value), line breaks are stripped and
    /// the length limit applies.
    pub fn replace_typed(&mut self, text: &str) {
        self.value.clear();
        self.cursor = 0;
        self.selection_anchor = None;
        self.insert_str(text);
    }

    /// Cursor position (grapheme index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the input holds keyboard focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Drop focus and any selection.
    pub fn release_focus(&mut self) {
        self.focused = false;
        self.selection_anchor = None;
    }

    /// Select the whole text.
    pub fn select_all(&mut self) {
        self.selection_anchor = Some(0);
        self.cursor = self.grapheme_count();
    }

    /// Selected grapheme range `[start, end)`, if any.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let anchor = self.selection_anchor?;
        let (start, end) = ordered(anchor, self.cursor);
        (start < end).then_some((start, end))
    }

    /// Selected text, if any.
    pub fn selected_text(&self) -> Option<&str> {
        let (start, end) = self.selection_range()?;
        let byte_start = self.grapheme_byte_offset(start);
        let byte_end = self.grapheme_byte_offset(end);
        Some(&self.value[byte_start..byte_end])
    }

    /// Whether every grapheme is selected (and there is at least one).
    pub fn is_all_selected(&self) -> bool {
        self.selection_range() == Some((0, self.grapheme_count()))
    }

    // --- Event handling ---

    /// Feed an input event. Returns `true` if the event was consumed.
    ///
    /// Enter and Escape are never consumed here; the field owns them.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => self.handle_key(key),
            Event::Paste(paste) => {
                self.insert_str(&paste.text);
                true
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.ctrl();
        let shift = key.shift();

        match key.code {
            KeyCode::Char('a') if ctrl => {
                self.select_all();
                true
            }
            KeyCode::Char(c) if !ctrl => {
                self.delete_selection();
                self.insert_char(c);
                true
            }
            KeyCode::Backspace => {
                if self.selection_range().is_some() {
                    self.delete_selection();
                } else if ctrl {
                    self.delete_word_back();
                } else {
                    self.delete_char_back();
                }
                true
            }
            KeyCode::Delete => {
                if self.selection_range().is_some() {
                    self.delete_selection();
                } else {
                    self.delete_char_forward();
                }
                true
            }
            KeyCode::Left => {
                if ctrl {
                    self.move_word(Direction::Left, shift);
                } else {
                    self.move_cursor(Direction::Left, shift);
                }
                true
            }
            KeyCode::Right => {
                if ctrl {
                    self.move_word(Direction::Right, shift);
                } else {
                    self.move_cursor(Direction::Right, shift);
                }
                true
            }
            KeyCode::Home => {
                self.anchor_for(shift);
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.anchor_for(shift);
                self.cursor = self.grapheme_count();
                true
            }
            _ => false,
        }
    }

    // --- Editing operations ---

    fn insert_char(&mut self, c: char) {
        if self.at_capacity() {
            return;
        }
        let byte_offset = self.grapheme_byte_offset(self.cursor);
        self.value.insert(byte_offset, c);
        // A combining mark may merge into the previous grapheme.
        self.cursor = self.grapheme_count_until(byte_offset + c.len_utf8());
    }

    /// Insert pasted text at the cursor, replacing any selection.
    ///
    /// Line breaks are dropped: the draft is single-line.
    fn insert_str(&mut self, text: &str) {
        self.delete_selection();
        let flattened: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        for g in flattened.graphemes(true) {
            if self.at_capacity() {
                break;
            }
            let byte_offset = self.grapheme_byte_offset(self.cursor);
            self.value.insert_str(byte_offset, g);
            self.cursor = self.grapheme_count_until(byte_offset + g.len());
        }
    }

    fn delete_char_back(&mut self) {
        if self.cursor > 0 {
            self.drain_graphemes(self.cursor - 1, self.cursor);
            self.cursor -= 1;
        }
    }

    fn delete_char_forward(&mut self) {
        if self.cursor < self.grapheme_count() {
            self.drain_graphemes(self.cursor, self.cursor + 1);
        }
    }

    fn delete_word_back(&mut self) {
        let end = self.cursor;
        let start = self.word_boundary(Direction::Left);
        if start < end {
            self.drain_graphemes(start, end);
            self.cursor = start;
        }
    }

    fn delete_selection(&mut self) {
        if let Some((start, end)) = self.selection_range() {
            self.drain_graphemes(start, end);
            self.cursor = start;
        }
        self.selection_anchor = None;
    }

    fn drain_graphemes(&mut self, start: usize, end: usize) {
        let byte_start = self.grapheme_byte_offset(start);
        let byte_end = self.grapheme_byte_offset(end);
        self.value.drain(byte_start..byte_end);
    }

    // --- Cursor movement ---

    fn anchor_for(&mut self, extend: bool) {
        if extend {
            if self.selection_anchor.is_none() {
                self.selection_anchor = Some(self.cursor);
            }
        } else {
            self.selection_anchor = None;
        }
    }

    fn move_cursor(&mut self, direction: Direction, extend: bool) {
        if !extend && let Some((start, end)) = self.selection_range() {
            // Collapse the selection to the side we are moving towards.
            self.selection_anchor = None;
            self.cursor = match direction {
                Direction::Left => start,
                Direction::Right => end,
            };
            return;
        }
        self.anchor_for(extend);
        match direction {
            Direction::Left => self.cursor = self.cursor.saturating_sub(1),
            Direction::Right => self.cursor = (self.cursor + 1).min(self.grapheme_count()),
        }
    }

    fn move_word(&mut self, direction: Direction, extend: bool) {
        self.anchor_for(extend);
        self.cursor = self.word_boundary(direction);
    }

    /// Next position after skipping one run of same-class graphemes.
    fn word_boundary(&self, direction: Direction) -> usize {
        let graphemes: Vec<&str> = self.value.graphemes(true).collect();
        let mut pos = self.cursor.min(graphemes.len());
        match direction {
            Direction::Left => {
                if pos == 0 {
                    return 0;
                }
                let target = GraphemeClass::of(graphemes[pos - 1]);
                while pos > 0 && GraphemeClass::of(graphemes[pos - 1]) == target {
                    pos -= 1;
                }
            }
            Direction::Right => {
                if pos >= graphemes.len() {
                    return graphemes.len();
                }
                let target = GraphemeClass::of(graphemes[pos]);
                while pos < graphemes.len() && GraphemeClass::of(graphemes[pos]) == target {
                    pos += 1;
                }
            }
        }
        pos
    }

    // --- Viewport ---

    /// Compute what is visible in a cell `width` columns wide.
    ///
    /// The window scrolls horizontally just enough to keep the cursor visible.
    pub fn window(&self, width: usize) -> DraftWindow {
        if width == 0 {
            return DraftWindow {
                text: String::new(),
                cursor_col: 0,
                selection: None,
            };
        }

        let cursor_visual = self.cursor_visual_pos();
        let scroll = (cursor_visual + 1).saturating_sub(width);
        let selection = self.selection_range();

        let mut text = String::new();
        let mut visual_x = 0usize;
        let mut sel_cols: Option<(usize, usize)> = None;

        for (gi, g) in self.value.graphemes(true).enumerate() {
            let w = self.grapheme_width(g);
            if visual_x < scroll {
                visual_x += w;
                continue;
            }
            let rel_x = visual_x - scroll;
            if rel_x + w > width {
                break;
            }
            match self.mask_char {
                Some(mask) => text.push(mask),
                None => text.push_str(g),
            }
            if let Some((start, end)) = selection
                && gi >= start
                && gi < end
            {
                sel_cols = Some(match sel_cols {
                    Some((s, _)) => (s, rel_x + w),
                    None => (rel_x, rel_x + w),
                });
            }
            visual_x += w;
        }

        DraftWindow {
            text,
            cursor_col: cursor_visual - scroll,
            selection: sel_cols,
        }
    }

    // --- Internal helpers ---

    fn at_capacity(&self) -> bool {
        self.max_length
            .is_some_and(|max| self.grapheme_count() >= max)
    }

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    fn grapheme_count_until(&self, byte_offset: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .take_while(|(i, _)| *i < byte_offset)
            .count()
    }

    fn grapheme_byte_offset(&self, grapheme_idx: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(grapheme_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn grapheme_width(&self, g: &str) -> usize {
        if self.mask_char.is_some() {
            1
        } else {
            UnicodeWidthStr::width(g)
        }
    }

    fn cursor_visual_pos(&self) -> usize {
        self.value
            .graphemes(true)
            .take(self.cursor)
            .map(|g| self.grapheme_width(g))
            .sum()
    }
}

impl FocusTarget for DraftInput {
    fn focus(&mut self) {
        self.focused = true;
    }

    fn select_all(&mut self) {
        DraftInput::select_all(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphemeClass {
    Space,
    Word,
    Punct,
}

impl GraphemeClass {
    fn of(g: &str) -> Self {
        if g.chars().all(char::is_whitespace) {
            Self::Space
        } else if g.chars().any(char::is_alphanumeric) {
            Self::Word
        } else {
            Self::Punct
        }
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inedit_core::event::{Modifiers, PasteEvent};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn key_mod(code: KeyCode, modifiers: Modifiers) -> Event {
        Event::Key(KeyEvent::new(code).with_modifiers(modifiers))
    }

    fn draft(value: &str) -> DraftInput {
        let mut input = DraftInput::new();
        input.set_value(value);
        input
    }

    #[test]
    fn set_value_moves_cursor_to_end() {
        let input = draft("Room 1");
        assert_eq!(input.value(), "Room 1");
        assert_eq!(input.cursor(), 6);
        assert!(input.selection_range().is_none());
    }

    #[test]
    fn typing_replaces_full_selection() {
        let mut input = draft("Room 1");
        input.select_all();
        assert!(input.is_all_selected());
        input.handle_event(&key(KeyCode::Char('X')));
        assert_eq!(input.value(), "X");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn backspace_and_delete() {
        let mut input = draft("Room 12");
        input.handle_event(&key(KeyCode::Backspace));
        assert_eq!(input.value(), "Room 1");
        input.handle_event(&key(KeyCode::Home));
        input.handle_event(&key(KeyCode::Delete));
        assert_eq!(input.value(), "oom 1");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn ctrl_backspace_deletes_word() {
        let mut input = draft("Lobby greeting");
        input.handle_event(&key_mod(KeyCode::Backspace, Modifiers::CTRL));
        assert_eq!(input.value(), "Lobby ");
        input.handle_event(&key_mod(KeyCode::Backspace, Modifiers::CTRL));
        assert_eq!(input.value(), "Lobby");
    }

    #[test]
    fn word_movement() {
        let mut input = draft("hello world");
        input.handle_event(&key_mod(KeyCode::Left, Modifiers::CTRL));
        assert_eq!(input.cursor(), 6);
        input.handle_event(&key_mod(KeyCode::Left, Modifiers::CTRL));
        assert_eq!(input.cursor(), 5);
        input.handle_event(&key_mod(KeyCode::Left, Modifiers::CTRL));
        assert_eq!(input.cursor(), 0);
        input.handle_event(&key_mod(KeyCode::Right, Modifiers::CTRL));
        assert_eq!(input.cursor(), 5);
    }

    #[test]
    fn shift_arrows_extend_selection() {
        let mut input = draft("abcd");
        input.handle_event(&key_mod(KeyCode::Left, Modifiers::SHIFT));
        input.handle_event(&key_mod(KeyCode::Left, Modifiers::SHIFT));
        assert_eq!(input.selected_text(), Some("cd"));
        // Plain left collapses to the start of the selection.
        input.handle_event(&key(KeyCode::Left));
        assert_eq!(input.cursor(), 2);
        assert!(input.selected_text().is_none());
    }

    #[test]
    fn enter_and_escape_are_not_consumed() {
        let mut input = draft("x");
        assert!(!input.handle_event(&key(KeyCode::Enter)));
        assert!(!input.handle_event(&key(KeyCode::Escape)));
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn max_length_limits_typing_and_paste() {
        let mut input = DraftInput::new().with_max_length(Some(4));
        input.set_value("Room 1");
        // Seeded values are kept whole.
        assert_eq!(input.value(), "Room 1");
        input.handle_event(&key(KeyCode::Char('!')));
        assert_eq!(input.value(), "Room 1");

        input.set_value("Roo");
        input.handle_event(&Event::Paste(PasteEvent::new("mmmm")));
        assert_eq!(input.value(), "Room");
    }

    #[test]
    fn replace_typed_respects_limit() {
        let mut input = DraftInput::new().with_max_length(Some(4));
        input.set_value("Conference");
        input.replace_typed("Hall\nway");
        assert_eq!(input.value(), "Hall");
        assert_eq!(input.cursor(), 4);
        assert!(input.selection_range().is_none());
    }

    #[test]
    fn paste_strips_line_breaks() {
        let mut input = draft("");
        input.handle_event(&Event::Paste(PasteEvent::new("Room\r\n 5")));
        assert_eq!(input.value(), "Room 5");
        assert_eq!(input.cursor(), 6);
    }

    #[test]
    fn graphemes_delete_as_one_unit() {
        let mut input = draft("e\u{301}x");
        assert_eq!(input.cursor(), 2);
        input.handle_event(&key(KeyCode::Left));
        input.handle_event(&key(KeyCode::Backspace));
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn focus_target_focuses_then_selects() {
        let mut input = draft("Room 1");
        FocusTarget::focus(&mut input);
        FocusTarget::select_all(&mut input);
        assert!(input.is_focused());
        assert!(input.is_all_selected());
        input.release_focus();
        assert!(!input.is_focused());
        assert!(input.selection_range().is_none());
    }

    #[test]
    fn window_scrolls_to_cursor() {
        let input = draft("abcdefgh");
        let window = input.window(4);
        assert_eq!(window.text, "fgh");
        assert_eq!(window.cursor_col, 3);
    }

    #[test]
    fn window_reports_selection_columns() {
        let mut input = draft("Room 1");
        input.select_all();
        let window = input.window(10);
        assert_eq!(window.text, "Room 1");
        assert_eq!(window.selection, Some((0, 6)));
    }

    #[test]
    fn window_masks_text() {
        let mut input = DraftInput::new().with_mask(Some('*'));
        input.set_value("pin");
        assert_eq!(input.window(10).text, "***");
    }

    #[test]
    fn zero_width_window_is_empty() {
        let input = draft("abc");
        assert_eq!(input.window(0).text, "");
    }
}
