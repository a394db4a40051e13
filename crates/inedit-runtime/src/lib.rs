#![forbid(unsafe_code)]

//! inedit runtime
//!
//! Hosts editable fields in a terminal application.
//!
//! # Key Components
//!
//! - [`Program`] - Elm-style event loop over a crossterm terminal session
//! - [`Model`] - Trait for application state and behavior
//! - [`Cmd`] - Commands for side effects, including background tasks and
//!   messages delivered after the next presented frame
//! - [`Frame`] - Styled cell grid the model draws into
//! - [`FieldSet`] - Mounted fields and commit resolution routing
//! - [`ProgramSimulator`] - Headless deterministic host for tests

pub mod field_view;
pub mod fields;
pub mod frame;
pub mod program;
pub mod simulator;
pub mod terminal;

pub use field_view::{FieldArea, draw_field};
pub use fields::{CommitResolution, FieldSet, commit_task};
pub use frame::{Cell, Frame, HitRegion};
pub use program::{Cmd, Model, Program, ProgramConfig};
pub use simulator::{CmdRecord, ProgramSimulator, TaskMode};
pub use terminal::{SessionOptions, TerminalSession};
