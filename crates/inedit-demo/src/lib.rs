#![forbid(unsafe_code)]

//! Room settings demo for inedit.
//!
//! The binary wires these modules to a real terminal; tests drive the same
//! model through the runtime's simulator.

pub mod app;
pub mod cli;
pub mod logging;
pub mod store;
