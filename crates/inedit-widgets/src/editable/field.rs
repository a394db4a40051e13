#![forbid(unsafe_code)]

//! The editable field: state machine, draft input, configuration and commit
//! pipeline behind one event-driven API.
//!
//! The field never spawns work. When an exit produces a commit,
//! [`EditableField::handle_event`] returns [`FieldResponse::Commit`] and the
//! host decides where to run it: inline with [`EditableField::run_commit`],
//! or elsewhere with a clone of [`EditableField::pipeline`] and a later
//! [`EditableField::resolve`].

use inedit_core::event::{Event, KeyCode};

use super::commit::{
    CommitOutcome, CommitPipeline, CommitRequest, CommitTicket, FieldId, FieldKey,
};
use super::config::FieldConfig;
use super::focus::run_focus_effects;
use super::machine::{Effect, EditMachine, EditState, FieldEvent, FieldStatus};
use super::presentation::{RenderDecision, present};
use crate::draft::DraftInput;
use crate::error::FieldError;

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResponse {
    /// Nothing changed.
    Ignored,
    /// The field changed and should be redrawn.
    Updated,
    /// The field entered `Committing`; the host must run this commit.
    Commit(CommitRequest),
}

impl FieldResponse {
    /// The commit request, if one was produced.
    pub fn into_commit(self) -> Option<CommitRequest> {
        match self {
            Self::Commit(request) => Some(request),
            Self::Ignored | Self::Updated => None,
        }
    }

    /// Whether anything changed.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

/// Builder for [`EditableField`].
#[derive(Debug)]
pub struct EditableFieldBuilder {
    key: String,
    value: String,
    pipeline: CommitPipeline,
    config: FieldConfig,
}

impl EditableFieldBuilder {
    /// Replace the configuration.
    #[must_use]
    pub fn config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the key and configuration and build the field.
    ///
    /// # Errors
    ///
    /// Any [`FieldError`] from the key or [`FieldConfig::validate`].
    pub fn build(self) -> Result<EditableField, FieldError> {
        let key = FieldKey::new(self.key)?;
        self.config.validate()?;
        let input = DraftInput::new()
            .with_mask(self.config.input.mask)
            .with_max_length(self.config.input.max_length);
        let machine = EditMachine::new(key, self.value);
        inedit_core::debug!(field = %machine.id(), key = %machine.key(), "field created");
        Ok(EditableField {
            machine,
            input,
            config: self.config,
            pipeline: self.pipeline,
        })
    }
}

/// An in-place editable text field.
#[derive(Debug)]
pub struct EditableField {
    machine: EditMachine,
    input: DraftInput,
    config: FieldConfig,
    pipeline: CommitPipeline,
}

impl EditableField {
    /// Start building a field for `key` showing `value`.
    pub fn builder(
        key: impl Into<String>,
        value: impl Into<String>,
        pipeline: CommitPipeline,
    ) -> EditableFieldBuilder {
        EditableFieldBuilder {
            key: key.into(),
            value: value.into(),
            pipeline,
            config: FieldConfig::default(),
        }
    }

    /// Identity of this field instance.
    pub fn id(&self) -> FieldId {
        self.machine.id()
    }

    /// Key of the edited property.
    pub fn key(&self) -> &FieldKey {
        self.machine.key()
    }

    /// Current status.
    pub fn status(&self) -> FieldStatus {
        self.machine.status()
    }

    /// Full state.
    pub fn state(&self) -> &EditState {
        self.machine.state()
    }

    /// Last known-good value.
    pub fn committed_value(&self) -> &str {
        self.machine.committed()
    }

    /// Draft, while editing or committing.
    pub fn draft_value(&self) -> Option<&str> {
        self.machine.draft()
    }

    /// The commit in flight, if any.
    pub fn in_flight(&self) -> Option<CommitTicket> {
        self.machine.in_flight()
    }

    /// The draft input buffer.
    pub fn input(&self) -> &DraftInput {
        &self.input
    }

    /// Configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The commit pipeline, for hosts that run commits off-thread.
    pub fn pipeline(&self) -> &CommitPipeline {
        &self.pipeline
    }

    /// Presentation of the current state.
    pub fn render(&self) -> RenderDecision<'_> {
        present(self.machine.state(), self.machine.committed(), &self.config)
    }

    /// Programmatically enter editing.
    pub fn activate(&mut self) -> FieldResponse {
        self.apply(FieldEvent::Activate)
    }

    /// The field lost focus; commits a changed draft.
    pub fn blur(&mut self) -> FieldResponse {
        self.apply(FieldEvent::Exit)
    }

    /// Discard the draft.
    pub fn cancel(&mut self) -> FieldResponse {
        self.apply(FieldEvent::Cancel)
    }

    /// Replace the whole draft, as if the user had typed it.
    ///
    /// The configured `max_length` applies and line breaks are dropped.
    pub fn set_draft(&mut self, value: &str) -> FieldResponse {
        if self.status() != FieldStatus::Editing {
            return FieldResponse::Ignored;
        }
        self.input.replace_typed(value);
        let draft = self.input.value().to_string();
        self.apply(FieldEvent::DraftChanged(draft))
    }

    /// Route one input event.
    ///
    /// Pointer events are expected to be hit-tested by the host: a primary
    /// press delivered here activates a viewing field.
    pub fn handle_event(&mut self, event: &Event) -> FieldResponse {
        match self.status() {
            FieldStatus::Viewing => match event {
                Event::Mouse(mouse) if mouse.is_primary_press() => self.activate(),
                _ => FieldResponse::Ignored,
            },
            FieldStatus::Editing => self.handle_editing_event(event),
            FieldStatus::Committing | FieldStatus::Invalid => FieldResponse::Ignored,
        }
    }

    fn handle_editing_event(&mut self, event: &Event) -> FieldResponse {
        if let Some(key) = event.key_press() {
            match key.code {
                KeyCode::Enter => return self.apply(FieldEvent::Exit),
                KeyCode::Escape => return self.apply(FieldEvent::Cancel),
                _ => {}
            }
        }
        if let Event::Focus(false) = event {
            return self.apply(FieldEvent::Exit);
        }

        let before = self.input.value().to_string();
        let consumed = self.input.handle_event(event);
        if self.input.value() != before {
            self.apply(FieldEvent::DraftChanged(self.input.value().to_string()))
        } else if consumed {
            FieldResponse::Updated
        } else {
            FieldResponse::Ignored
        }
    }

    /// Deliver the outcome of the commit named by `ticket`.
    ///
    /// Returns `false` when the ticket is stale and the outcome was dropped.
    pub fn resolve(&mut self, ticket: CommitTicket, outcome: CommitOutcome) -> bool {
        !self
            .apply(FieldEvent::Resolved { ticket, outcome })
            .is_ignored()
    }

    /// Run `request` through the pipeline on the current thread and resolve.
    pub fn run_commit(&mut self, request: &CommitRequest) -> CommitOutcome {
        let outcome = self.pipeline.commit(request);
        self.resolve(request.ticket, outcome.clone());
        outcome
    }

    /// The host presented a frame. Clears the invalid state.
    pub fn frame_presented(&mut self) -> bool {
        !self.apply(FieldEvent::FramePresented).is_ignored()
    }

    /// Offer a new external value; adopted now if viewing, else deferred.
    pub fn set_value(&mut self, value: impl Into<String>) -> bool {
        self.machine.set_external(value)
    }

    fn apply(&mut self, event: FieldEvent) -> FieldResponse {
        let before = self.machine.state().clone();
        let effects = self.machine.step(event);
        run_focus_effects(&mut self.input, &effects);

        let commit = effects.into_iter().find_map(|effect| match effect {
            Effect::Commit(request) => Some(request),
            _ => None,
        });
        match commit {
            Some(request) => FieldResponse::Commit(request),
            None if *self.machine.state() != before => FieldResponse::Updated,
            None => FieldResponse::Ignored,
        }
    }
}
