#![forbid(unsafe_code)]

//! The terminal panic hook against panics the commit pipeline recovers.
//!
//! Panic hooks are process-wide, so this file holds a single test and owns
//! the hook of its test binary.

use inedit_runtime::terminal::{install_panic_hook, panic_restores};
use inedit_widgets::{CommitOutcome, CommitPipeline, EditableField, FieldPayload};

#[test]
fn recovered_commit_panic_leaves_terminal_alone() {
    install_panic_hook();

    let pipeline = CommitPipeline::new(|_: &FieldPayload| -> Result<(), String> {
        panic!("store offline")
    });
    let mut field = EditableField::builder("room", "Room 1", pipeline)
        .build()
        .unwrap();
    field.activate();
    field.set_draft("Room 2");
    let request = field.blur().into_commit().unwrap();

    let outcome = field.run_commit(&request);
    assert_eq!(outcome, CommitOutcome::Rejected("store offline".to_string()));
    assert_eq!(panic_restores(), 0);

    let fatal = std::thread::spawn(|| panic!("render bug")).join();
    assert!(fatal.is_err());
    assert_eq!(panic_restores(), 1);
}
