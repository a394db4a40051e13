#![forbid(unsafe_code)]

//! Hosting editable fields inside a [`Model`](crate::program::Model).
//!
//! [`FieldSet`] owns the mounted fields and routes commit resolutions back to
//! them by [`FieldId`]. A resolution for a field that has been unmounted is
//! dropped with a debug log. [`commit_task`] turns a commit request into a
//! background [`Cmd::Task`].

use inedit_widgets::{CommitOutcome, CommitRequest, CommitTicket, EditableField, FieldId};
use tracing::debug;

use crate::program::Cmd;

/// Outcome of a background commit, addressed to the field that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResolution {
    /// The commit this resolves.
    pub ticket: CommitTicket,
    /// How it went.
    pub outcome: CommitOutcome,
}

/// Run `request` through `field`'s pipeline on a background thread.
///
/// `wrap` turns the resolution into the model's message type.
pub fn commit_task<M, F>(field: &EditableField, request: CommitRequest, wrap: F) -> Cmd<M>
where
    F: FnOnce(CommitResolution) -> M + Send + 'static,
{
    let pipeline = field.pipeline().clone();
    Cmd::task(move || {
        let outcome = pipeline.commit(&request);
        wrap(CommitResolution {
            ticket: request.ticket,
            outcome,
        })
    })
}

/// The fields a screen currently shows, in tab order.
#[derive(Debug, Default)]
pub struct FieldSet {
    fields: Vec<EditableField>,
}

impl FieldSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a field at the end of the tab order. Returns its id.
    pub fn mount(&mut self, field: EditableField) -> FieldId {
        let id = field.id();
        debug!(field = %id, key = %field.key(), "field mounted");
        self.fields.push(field);
        id
    }

    /// Unmount a field. Resolutions still in flight for it will be dropped.
    pub fn unmount(&mut self, id: FieldId) -> Option<EditableField> {
        let index = self.index_of(id)?;
        let field = self.fields.remove(index);
        if let Some(ticket) = field.in_flight() {
            debug!(field = %id, seq = ticket.seq, "field unmounted with commit in flight");
        } else {
            debug!(field = %id, "field unmounted");
        }
        Some(field)
    }

    /// Position of `id` in tab order.
    pub fn index_of(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|f| f.id() == id)
    }

    /// Field by id.
    pub fn get(&self, id: FieldId) -> Option<&EditableField> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Field by id, mutably.
    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut EditableField> {
        self.fields.iter_mut().find(|f| f.id() == id)
    }

    /// Field by raw id, as registered in a frame's hit grid.
    pub fn find_by_raw_id(&self, raw: u64) -> Option<FieldId> {
        self.fields
            .iter()
            .map(EditableField::id)
            .find(|id| id.get() == raw)
    }

    /// Field at tab position `index`.
    pub fn at(&self, index: usize) -> Option<&EditableField> {
        self.fields.get(index)
    }

    /// Field at tab position `index`, mutably.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut EditableField> {
        self.fields.get_mut(index)
    }

    /// Fields in tab order.
    pub fn iter(&self) -> impl Iterator<Item = &EditableField> {
        self.fields.iter()
    }

    /// Number of mounted fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing is mounted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Deliver a background commit result.
    ///
    /// Returns the field's id when the resolution was applied; `None` when
    /// the field is gone or the ticket is stale.
    pub fn resolve(&mut self, resolution: CommitResolution) -> Option<FieldId> {
        let id = resolution.ticket.field;
        let Some(field) = self.get_mut(id) else {
            debug!(
                field = %id,
                seq = resolution.ticket.seq,
                "resolution for unmounted field dropped"
            );
            return None;
        };
        if field.resolve(resolution.ticket, resolution.outcome) {
            Some(id)
        } else {
            debug!(field = %id, seq = resolution.ticket.seq, "stale resolution dropped");
            None
        }
    }

    /// Tell every field a frame was presented. Returns `true` if any changed.
    pub fn frame_presented(&mut self) -> bool {
        let mut changed = false;
        for field in &mut self.fields {
            changed |= field.frame_presented();
        }
        changed
    }

    /// Id of the field currently editing, if any.
    pub fn editing(&self) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|f| f.status() == inedit_widgets::FieldStatus::Editing)
            .map(EditableField::id)
    }
}
