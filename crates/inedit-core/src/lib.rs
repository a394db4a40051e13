#![forbid(unsafe_code)]

//! Core: canonical input events, logging shims and panic recovery scopes
//! shared by every inedit crate.

pub mod event;
pub mod logging;
pub mod recovery;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, trace, warn};
