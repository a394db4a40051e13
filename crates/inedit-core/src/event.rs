#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! Every host (terminal runtime, headless simulator, tests) feeds fields with
//! these types. Crossterm events are mapped once at the boundary so that the
//! field controller never sees backend-specific types.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 0-indexed.
//! - `KeyEventKind` defaults to `Press` when the terminal cannot report kinds.
//! - `Focus(false)` is the terminal losing focus; hosts treat it as a blur of
//!   whichever field is editing.

use bitflags::bitflags;
use crossterm::event as cte;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Text pasted in one piece (bracketed paste).
    Paste(PasteEvent),

    /// Terminal focus gained (`true`) or lost (`false`).
    Focus(bool),

    /// Terminal was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },
}

impl Event {
    /// Convert a Crossterm event into an [`Event`].
    ///
    /// Returns `None` for key codes the controller has no use for.
    #[must_use]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => map_key_event(key).map(Event::Key),
            cte::Event::Mouse(mouse) => Some(Event::Mouse(map_mouse_event(mouse))),
            cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            cte::Event::Paste(text) => Some(Event::Paste(PasteEvent::new(text))),
            cte::Event::FocusGained => Some(Event::Focus(true)),
            cte::Event::FocusLost => Some(Event::Focus(false)),
        }
    }

    /// The key event, if this is a key press or repeat.
    ///
    /// Release events are filtered out so that a single physical keystroke
    /// never triggers two transitions on terminals that report releases.
    #[must_use]
    pub fn key_press(&self) -> Option<&KeyEvent> {
        match self {
            Event::Key(key) if key.is_press() => Some(key),
            _ => None,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Replace the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Replace the kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Press or auto-repeat.
    #[must_use]
    pub const fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// Key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Enter/Return.
    Enter,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Tab.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Delete.
    Delete,
    /// Home.
    Home,
    /// End.
    End,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,
    /// Key is being held.
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// What happened.
    pub kind: MouseEventKind,
    /// Column (0-indexed).
    pub x: u16,
    /// Row (0-indexed).
    pub y: u16,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Primary (left) button pressed. This is the pointer activation gesture.
    #[must_use]
    pub const fn is_primary_press(&self) -> bool {
        matches!(self.kind, MouseEventKind::Down(MouseButton::Left))
    }
}

/// The type of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed.
    Down(MouseButton),
    /// Button released.
    Up(MouseButton),
    /// Moved while a button is held.
    Drag(MouseButton),
    /// Moved with no button held.
    Moved,
    /// Wheel up.
    ScrollUp,
    /// Wheel down.
    ScrollDown,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,
    /// Right mouse button.
    Right,
    /// Middle mouse button.
    Middle,
}

/// Text pasted as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    /// The pasted text.
    pub text: String,
}

impl PasteEvent {
    /// Create a paste event.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    let kind = match event.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };
    Some(KeyEvent {
        code,
        modifiers: map_modifiers(event.modifiers),
        kind,
    })
}

fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    match code {
        cte::KeyCode::Char(c) => Some(KeyCode::Char(c)),
        cte::KeyCode::Enter => Some(KeyCode::Enter),
        cte::KeyCode::Esc => Some(KeyCode::Escape),
        cte::KeyCode::Backspace => Some(KeyCode::Backspace),
        cte::KeyCode::Tab => Some(KeyCode::Tab),
        cte::KeyCode::BackTab => Some(KeyCode::BackTab),
        cte::KeyCode::Delete => Some(KeyCode::Delete),
        cte::KeyCode::Home => Some(KeyCode::Home),
        cte::KeyCode::End => Some(KeyCode::End),
        cte::KeyCode::Up => Some(KeyCode::Up),
        cte::KeyCode::Down => Some(KeyCode::Down),
        cte::KeyCode::Left => Some(KeyCode::Left),
        cte::KeyCode::Right => Some(KeyCode::Right),
        cte::KeyCode::F(n) => Some(KeyCode::F(n)),
        _ => None,
    }
}

fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.intersects(
        cte::KeyModifiers::SUPER | cte::KeyModifiers::HYPER | cte::KeyModifiers::META,
    ) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

fn map_mouse_event(event: cte::MouseEvent) -> MouseEvent {
    let kind = match event.kind {
        cte::MouseEventKind::Down(button) => MouseEventKind::Down(map_mouse_button(button)),
        cte::MouseEventKind::Up(button) => MouseEventKind::Up(map_mouse_button(button)),
        cte::MouseEventKind::Drag(button) => MouseEventKind::Drag(map_mouse_button(button)),
        cte::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        cte::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        // Horizontal wheel has no meaning for a single-line field.
        cte::MouseEventKind::Moved
        | cte::MouseEventKind::ScrollLeft
        | cte::MouseEventKind::ScrollRight => MouseEventKind::Moved,
    };

    MouseEvent {
        kind,
        x: event.column,
        y: event.row,
        modifiers: map_modifiers(event.modifiers),
    }
}

fn map_mouse_button(button: cte::MouseButton) -> MouseButton {
    match button {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Right => MouseButton::Right,
        cte::MouseButton::Middle => MouseButton::Middle,
    }
}
