#![forbid(unsafe_code)]

//! Room settings screen.
//!
//! Two fields, room name and lobby greeting, edited in place. Writes go to
//! the [`RoomStore`] on background tasks; the status line reports the last
//! outcome.
//!
//! Input routing:
//! - while a field is editing, keys go to it; Tab/Shift-Tab blur it (which
//!   commits a changed draft) and move focus
//! - otherwise Tab/Shift-Tab move focus, Enter activates the focused field
//!   and `q` quits
//! - a primary click activates the field under the pointer and blurs the
//!   one being edited, if different
//! - Ctrl+C always quits

use std::fmt;
use std::sync::Arc;

use crossterm::style::{Attribute, Color, ContentStyle};
use inedit_core::event::{Event, KeyCode};
use inedit_runtime::{
    Cmd, CommitResolution, FieldArea, FieldSet, Frame, Model, commit_task, draw_field,
};
use inedit_widgets::{
    ClassList, CommitOutcome, CommitPipeline, EditableField, FieldConfig, FieldError, FieldId,
    FieldPayload, FieldResponse, StyleSheet,
};

use crate::store::{GREETING_KEY, NAME_KEY, RoomStore};

/// Column where field labels start.
const LABEL_X: u16 = 2;
/// Column where fields start.
pub const FIELD_X: u16 = 14;
/// Width of every field.
pub const FIELD_WIDTH: u16 = 32;
/// Row of the first field.
pub const FIRST_FIELD_ROW: u16 = 2;

/// Screen messages.
#[derive(Debug)]
pub enum Msg {
    /// Terminal input.
    Input(Event),
    /// A background write finished.
    Resolved(CommitResolution),
    /// A frame showing a rejection was presented.
    Settle,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        Msg::Input(event)
    }
}

/// Last commit activity, shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing saved yet.
    #[default]
    Idle,
    /// A write for this key is in flight.
    Saving(String),
    /// The store accepted this key.
    Saved(String),
    /// The store refused this key.
    Rejected { key: String, reason: String },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Saving(key) => write!(f, "Saving {key}..."),
            Self::Saved(key) => write!(f, "Saved {key}"),
            Self::Rejected { key, reason } => write!(f, "{key} not saved: {reason}"),
        }
    }
}

impl Status {
    fn class(&self) -> &'static str {
        match self {
            Self::Idle | Self::Saving(_) => "status-saving",
            Self::Saved(_) => "status-saved",
            Self::Rejected { .. } => "status-rejected",
        }
    }
}

/// The room settings model.
#[derive(Debug)]
pub struct RoomSettings {
    store: Arc<RoomStore>,
    fields: FieldSet,
    labels: Vec<&'static str>,
    focus: usize,
    sheet: StyleSheet,
    status: Status,
}

impl RoomSettings {
    /// Screen over `store`, seeded from its current record.
    pub fn new(store: Arc<RoomStore>) -> Result<Self, FieldError> {
        let record = store.snapshot();
        let mut fields = FieldSet::new();
        fields.mount(
            EditableField::builder(NAME_KEY, record.name, pipeline(&store))
                .config(
                    FieldConfig::new()
                        .placeholder("Room name")
                        .empty_text("(unnamed)"),
                )
                .build()?,
        );
        fields.mount(
            EditableField::builder(GREETING_KEY, record.greeting, pipeline(&store))
                .config(
                    FieldConfig::new()
                        .placeholder("Say hello")
                        .empty_text("(no greeting)")
                        .max_length(64),
                )
                .build()?,
        );

        Ok(Self {
            store,
            fields,
            labels: vec!["Room name", "Greeting"],
            focus: 0,
            sheet: sheet(),
            status: Status::Idle,
        })
    }

    /// The backing store.
    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    /// Mounted fields.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Field with `key`, if mounted.
    pub fn field(&self, key: &str) -> Option<&EditableField> {
        self.fields.iter().find(|f| f.key().as_str() == key)
    }

    /// Tab position of the focused field.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Status line contents.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Screen area of the field at tab position `index`.
    pub fn area(index: usize) -> FieldArea {
        let row = FIRST_FIELD_ROW.saturating_add(u16::try_from(index).unwrap_or(u16::MAX));
        FieldArea::new(FIELD_X, row, FIELD_WIDTH)
    }

    fn status_row(&self) -> u16 {
        Self::area(self.fields.len()).y.saturating_add(1)
    }

    fn handle_input(&mut self, event: Event) -> Cmd<Msg> {
        if let Some(key) = event.key_press()
            && key.ctrl()
            && key.is_char('c')
        {
            return Cmd::quit();
        }
        if let Event::Mouse(mouse) = &event
            && mouse.is_primary_press()
        {
            return self.click(mouse.x, mouse.y, &event);
        }

        if let Some(editing) = self.fields.editing() {
            if let Some(key) = event.key_press()
                && matches!(key.code, KeyCode::Tab | KeyCode::BackTab)
            {
                let cmd = self.blur(editing);
                self.move_focus(key.code == KeyCode::Tab);
                return cmd;
            }
            let Some(field) = self.fields.get_mut(editing) else {
                return Cmd::none();
            };
            let response = field.handle_event(&event);
            return self.respond(editing, response);
        }

        let Some(key) = event.key_press() else {
            return Cmd::none();
        };
        match key.code {
            KeyCode::Char('q') if !key.ctrl() => Cmd::quit(),
            KeyCode::Tab => {
                self.move_focus(true);
                Cmd::none()
            }
            KeyCode::BackTab => {
                self.move_focus(false);
                Cmd::none()
            }
            KeyCode::Enter => self.activate_focused(),
            _ => Cmd::none(),
        }
    }

    fn click(&mut self, x: u16, y: u16, event: &Event) -> Cmd<Msg> {
        let target = (0..self.fields.len()).find(|&i| Self::area(i).contains(x, y));
        let target_id = target.and_then(|i| self.fields.at(i)).map(EditableField::id);

        let mut cmds = Vec::new();
        if let Some(editing) = self.fields.editing()
            && Some(editing) != target_id
        {
            cmds.push(self.blur(editing));
        }
        if let (Some(index), Some(id)) = (target, target_id) {
            self.focus = index;
            if let Some(field) = self.fields.get_mut(id) {
                let response = field.handle_event(event);
                cmds.push(self.respond(id, response));
            }
        }
        Cmd::batch(cmds)
    }

    fn activate_focused(&mut self) -> Cmd<Msg> {
        let Some(field) = self.fields.at_mut(self.focus) else {
            return Cmd::none();
        };
        let id = field.id();
        let response = field.activate();
        self.respond(id, response)
    }

    fn blur(&mut self, id: FieldId) -> Cmd<Msg> {
        let Some(field) = self.fields.get_mut(id) else {
            return Cmd::none();
        };
        let response = field.blur();
        self.respond(id, response)
    }

    fn respond(&mut self, id: FieldId, response: FieldResponse) -> Cmd<Msg> {
        let FieldResponse::Commit(request) = response else {
            return Cmd::none();
        };
        let Some(field) = self.fields.get(id) else {
            return Cmd::none();
        };
        self.status = Status::Saving(request.payload.key().to_string());
        commit_task(field, request, Msg::Resolved)
    }

    fn handle_resolution(&mut self, resolution: CommitResolution) -> Cmd<Msg> {
        let outcome = resolution.outcome.clone();
        let Some(id) = self.fields.resolve(resolution) else {
            return Cmd::none();
        };
        let key = self
            .fields
            .get(id)
            .map(|f| f.key().to_string())
            .unwrap_or_default();
        match outcome {
            CommitOutcome::Committed => {
                self.status = Status::Saved(key);
                Cmd::none()
            }
            CommitOutcome::Rejected(reason) => {
                let line = format!("{key} rejected: {reason}");
                self.status = Status::Rejected { key, reason };
                Cmd::batch(vec![Cmd::log(line), Cmd::next_frame(Msg::Settle)])
            }
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
    }

    fn style(&self, class: &str) -> ContentStyle {
        self.sheet.compose(&ClassList::new().with(class))
    }
}

impl Model for RoomSettings {
    type Message = Msg;

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Input(event) => self.handle_input(event),
            Msg::Resolved(resolution) => self.handle_resolution(resolution),
            Msg::Settle => {
                self.fields.frame_presented();
                Cmd::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame) {
        frame.print(LABEL_X, 0, "Room settings", self.style("title"));

        for (index, field) in self.fields.iter().enumerate() {
            let area = Self::area(index);
            if index == self.focus {
                frame.print(0, area.y, ">", self.style("label"));
            }
            let label = self.labels.get(index).copied().unwrap_or_default();
            frame.print(LABEL_X, area.y, label, self.style("label"));
            draw_field(frame, area, field, &self.sheet);
        }

        let status_row = self.status_row();
        frame.print(
            LABEL_X,
            status_row,
            &self.status.to_string(),
            self.style(self.status.class()),
        );
        frame.print(
            LABEL_X,
            status_row.saturating_add(2),
            "Tab: next field  Enter: edit/save  Esc: discard  q: quit",
            self.style("help"),
        );
    }
}

fn pipeline(store: &Arc<RoomStore>) -> CommitPipeline {
    let store = Arc::clone(store);
    CommitPipeline::new(move |payload: &FieldPayload| store.apply(payload))
}

fn sheet() -> StyleSheet {
    let sheet = StyleSheet::with_defaults();
    sheet.define(
        "title",
        ContentStyle {
            attributes: Attribute::Bold.into(),
            ..ContentStyle::new()
        },
    );
    sheet.define("label", ContentStyle::new());
    sheet.define(
        "status-saving",
        ContentStyle {
            attributes: Attribute::Dim.into(),
            ..ContentStyle::new()
        },
    );
    sheet.define(
        "status-saved",
        ContentStyle {
            foreground_color: Some(Color::Green),
            ..ContentStyle::new()
        },
    );
    sheet.define(
        "status-rejected",
        ContentStyle {
            foreground_color: Some(Color::Red),
            ..ContentStyle::new()
        },
    );
    sheet.define(
        "help",
        ContentStyle {
            attributes: Attribute::Dim.into(),
            ..ContentStyle::new()
        },
    );
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use inedit_core::event::{KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
    use inedit_runtime::{ProgramSimulator, TaskMode};
    use inedit_widgets::FieldStatus;

    use crate::store::RoomRecord;

    fn screen() -> RoomSettings {
        let store = RoomStore::new(
            RoomRecord {
                name: "Room 1".into(),
                greeting: "Hi all".into(),
            },
            Duration::ZERO,
            12,
        );
        RoomSettings::new(Arc::new(store)).unwrap()
    }

    fn sim() -> ProgramSimulator<RoomSettings> {
        let mut sim = ProgramSimulator::new(screen()).with_task_mode(TaskMode::Deferred);
        sim.init();
        sim
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn typed(text: &str) -> Vec<Event> {
        text.chars().map(|c| press(KeyCode::Char(c))).collect()
    }

    fn click(x: u16, y: u16) -> Event {
        Event::Mouse(MouseEvent::new(MouseEventKind::Down(MouseButton::Left), x, y))
    }

    fn status_of(sim: &ProgramSimulator<RoomSettings>, key: &str) -> FieldStatus {
        sim.model().field(key).unwrap().status()
    }

    #[test]
    fn first_frame_lists_fields_and_registers_hits() {
        let mut sim = sim();
        let name_id = sim.model().field(NAME_KEY).unwrap().id().get();
        let greeting_id = sim.model().field(GREETING_KEY).unwrap().id().get();
        let frame = sim.capture_frame(60, 10);
        assert!(frame.row_text(0).contains("Room settings"));
        assert!(frame.row_text(FIRST_FIELD_ROW).starts_with("> Room name"));
        assert!(frame.row_text(FIRST_FIELD_ROW).contains("Room 1"));
        assert!(frame.row_text(FIRST_FIELD_ROW + 1).contains("Hi all"));
        assert_eq!(frame.hit_test(FIELD_X, FIRST_FIELD_ROW), Some(name_id));
        assert_eq!(frame.hit_test(FIELD_X + 3, FIRST_FIELD_ROW + 1), Some(greeting_id));
        assert_eq!(frame.hit_test(0, 0), None);
    }

    #[test]
    fn enter_edits_and_saves_in_background() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Editing);
        sim.inject_events(&typed("Hall"));
        sim.inject_event(press(KeyCode::Enter));

        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Committing);
        assert_eq!(sim.model().status(), &Status::Saving(NAME_KEY.into()));
        assert_eq!(sim.run_pending_tasks(), 1);

        assert_eq!(sim.model().store().snapshot().name, "Hall");
        assert_eq!(sim.model().status(), &Status::Saved(NAME_KEY.into()));
        assert_eq!(sim.model().field(NAME_KEY).unwrap().committed_value(), "Hall");
    }

    #[test]
    fn tab_while_editing_commits_and_moves_focus() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_events(&typed("Hall"));
        sim.inject_event(press(KeyCode::Tab));

        assert_eq!(sim.model().focus(), 1);
        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Committing);
        assert_eq!(status_of(&sim, GREETING_KEY), FieldStatus::Viewing);
        assert_eq!(sim.pending_task_count(), 1);
    }

    #[test]
    fn tab_with_unchanged_draft_writes_nothing() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_event(press(KeyCode::BackTab));
        assert_eq!(sim.model().focus(), 1);
        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Viewing);
        assert_eq!(sim.pending_task_count(), 0);
        assert_eq!(sim.model().status(), &Status::Idle);
    }

    #[test]
    fn empty_name_is_rejected_for_one_frame() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_event(press(KeyCode::Backspace));
        sim.inject_event(press(KeyCode::Enter));
        sim.run_pending_tasks();

        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Invalid);
        assert_eq!(
            sim.model().status().to_string(),
            "name not saved: room name must not be empty"
        );
        assert_eq!(sim.logs(), ["name rejected: room name must not be empty".to_string()]);

        let frame = sim.capture_frame(60, 10);
        let cell = frame.cell(FIELD_X, FIRST_FIELD_ROW).unwrap();
        assert_eq!(cell.style.foreground_color, Some(Color::Red));
        assert!(frame.row_text(FIRST_FIELD_ROW).contains("Room 1"));

        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Viewing);
        assert_eq!(sim.model().store().writes(), 0);
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_events(&typed("A very long room name"));
        sim.inject_event(press(KeyCode::Enter));
        sim.run_pending_tasks();
        assert!(matches!(sim.model().status(), Status::Rejected { .. }));
        assert_eq!(sim.model().store().snapshot().name, "Room 1");
    }

    #[test]
    fn click_activates_field_under_pointer() {
        let mut sim = sim();
        sim.inject_event(click(FIELD_X + 2, FIRST_FIELD_ROW + 1));
        assert_eq!(sim.model().focus(), 1);
        assert_eq!(status_of(&sim, GREETING_KEY), FieldStatus::Editing);
        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Viewing);
    }

    #[test]
    fn click_elsewhere_blurs_the_editing_field() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_events(&typed("Hall"));
        sim.inject_event(click(0, 0));
        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Committing);
        assert_eq!(sim.pending_task_count(), 1);
    }

    #[test]
    fn click_on_other_field_commits_then_activates() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_events(&typed("Hall"));
        sim.inject_event(click(FIELD_X, FIRST_FIELD_ROW + 1));
        assert_eq!(status_of(&sim, NAME_KEY), FieldStatus::Committing);
        assert_eq!(status_of(&sim, GREETING_KEY), FieldStatus::Editing);
        sim.run_pending_tasks();
        assert_eq!(sim.model().store().snapshot().name, "Hall");
        assert_eq!(status_of(&sim, GREETING_KEY), FieldStatus::Editing);
    }

    #[test]
    fn q_types_while_editing_and_quits_otherwise() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_event(press(KeyCode::Char('q')));
        assert!(sim.is_running());
        assert_eq!(sim.model().field(NAME_KEY).unwrap().draft_value(), Some("q"));

        sim.inject_event(press(KeyCode::Escape));
        assert_eq!(sim.model().field(NAME_KEY).unwrap().committed_value(), "Room 1");
        sim.inject_event(press(KeyCode::Char('q')));
        assert!(!sim.is_running());
    }

    #[test]
    fn ctrl_c_quits_while_editing() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_event(Event::Key(
            KeyEvent::new(KeyCode::Char('c')).with_modifiers(Modifiers::CTRL),
        ));
        assert!(!sim.is_running());
    }

    #[test]
    fn status_line_styles_follow_outcome() {
        let mut sim = sim();
        sim.inject_event(press(KeyCode::Enter));
        sim.inject_events(&typed("Hall"));
        sim.inject_event(press(KeyCode::Enter));
        sim.run_pending_tasks();
        let row = RoomSettings::area(2).y + 1;
        let frame = sim.capture_frame(60, 10);
        assert!(frame.row_text(row).contains("Saved name"));
        assert_eq!(
            frame.cell(LABEL_X, row).unwrap().style.foreground_color,
            Some(Color::Green)
        );
    }
}
