#![forbid(unsafe_code)]

//! Widgets for inedit: the editable field controller, its draft input and the
//! class-based stylesheet hosts use to draw it.

pub mod draft;
pub mod editable;
pub mod error;
pub mod stylesheet;

pub use draft::{DraftInput, DraftWindow};
pub use editable::{
    ClassList, CommitOutcome, CommitPipeline, CommitRequest, CommitTicket, EditableField,
    FieldConfig, FieldEvent, FieldId, FieldKey, FieldPayload, FieldResponse, FieldStatus,
    RenderDecision,
};
pub use error::FieldError;
pub use stylesheet::StyleSheet;
