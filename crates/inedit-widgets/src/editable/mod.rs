#![forbid(unsafe_code)]

//! In-place editable field.
//!
//! A field shows a committed value as static text until activated, then edits
//! a draft in a live input and writes it back through a caller-supplied
//! update function when the input is left. Rejected writes roll back.

pub mod commit;
pub mod config;
pub mod field;
pub mod focus;
pub mod machine;
pub mod presentation;

pub use commit::{
    CommitOutcome, CommitPipeline, CommitRequest, CommitTicket, FieldId, FieldKey, FieldPayload,
    UpdateError,
};
pub use config::{FieldClasses, FieldConfig, InputAttrs};
pub use field::{EditableField, EditableFieldBuilder, FieldResponse};
pub use focus::{EditSurface, FocusTarget, run_focus_effects};
pub use machine::{EditMachine, EditState, Effect, FieldEvent, FieldStatus, Transition};
pub use presentation::{ClassList, RenderDecision, present};
