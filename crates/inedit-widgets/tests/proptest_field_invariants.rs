//! Property-based invariant tests for the editable field.
//!
//! Random sequences of field operations are replayed against a field whose
//! update function rejects empty values. After every step:
//!
//! 1. A draft exists exactly while editing or committing.
//! 2. The committed value changes only through a successful commit or an
//!    external update adopted while viewing.
//! 3. Each commit transition calls the update function exactly once; cancels
//!    and no-op exits never call it.
//! 4. At most one commit is in flight.
//! 5. The loading class is present exactly while committing and the invalid
//!    class exactly while invalid.

use std::sync::{Arc, Mutex};

use inedit_widgets::{
    CommitPipeline, CommitRequest, EditableField, FieldPayload, FieldResponse, FieldStatus,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Activate,
    Type(String),
    Exit,
    Cancel,
    /// Resolve the in-flight commit, if any.
    Resolve,
    FramePresented,
    External(String),
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Room 1".to_string()),
        Just("Room 2".to_string()),
        "[a-z ]{0,6}",
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Activate),
        value_strategy().prop_map(Op::Type),
        Just(Op::Exit),
        Just(Op::Cancel),
        Just(Op::Resolve),
        Just(Op::FramePresented),
        value_strategy().prop_map(Op::External),
    ]
}

struct Harness {
    field: EditableField,
    calls: Arc<Mutex<Vec<String>>>,
    pending: Option<CommitRequest>,
}

impl Harness {
    fn new(initial: &str) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let pipeline = CommitPipeline::new(move |payload: &FieldPayload| {
            sink.lock().unwrap().push(payload.value().to_string());
            if payload.value().is_empty() {
                Err("empty")
            } else {
                Ok(())
            }
        });
        let field = EditableField::builder("name", initial, pipeline)
            .build()
            .unwrap();
        Self {
            field,
            calls,
            pending: None,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Invariants over random operation sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn field_invariants_hold(
        initial in value_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..40),
    ) {
        let mut h = Harness::new(&initial);

        for op in ops {
            let status_before = h.field.status();
            let committed_before = h.field.committed_value().to_string();
            let draft_before = h.field.draft_value().map(str::to_string);
            let calls_before = h.call_count();
            let mut committed_successfully = false;
            let mut adopted_external = None;

            match op {
                Op::Activate => {
                    h.field.activate();
                }
                Op::Type(value) => {
                    h.field.set_draft(&value);
                }
                Op::Exit => {
                    if let FieldResponse::Commit(request) = h.field.blur() {
                        prop_assert!(h.pending.is_none(), "second commit while one in flight");
                        h.pending = Some(request);
                    }
                }
                Op::Cancel => {
                    h.field.cancel();
                }
                Op::Resolve => {
                    if let Some(request) = h.pending.take() {
                        let outcome = h.field.run_commit(&request);
                        committed_successfully = outcome.is_committed();
                    }
                }
                Op::FramePresented => {
                    h.field.frame_presented();
                }
                Op::External(value) => {
                    if h.field.set_value(value.clone()) {
                        adopted_external = Some(value);
                    }
                }
            }

            let status = h.field.status();

            // 1. draft exists iff editing or committing
            let draft_expected = matches!(status, FieldStatus::Editing | FieldStatus::Committing);
            prop_assert_eq!(h.field.draft_value().is_some(), draft_expected);

            // 2. committed value changes only through allowed paths
            let committed = h.field.committed_value().to_string();
            if committed != committed_before {
                let via_commit = committed_successfully
                    && draft_before.as_deref() == Some(committed.as_str());
                let via_external = adopted_external.as_deref() == Some(committed.as_str());
                let via_buffer = status == FieldStatus::Viewing
                    && status_before != FieldStatus::Viewing;
                prop_assert!(
                    via_commit || via_external || via_buffer,
                    "committed changed {:?} -> {:?} from {:?}",
                    committed_before, committed, status_before
                );
            }

            // 3. update function runs only when a commit resolves
            let new_calls = h.call_count() - calls_before;
            if new_calls > 0 {
                prop_assert_eq!(new_calls, 1);
                prop_assert_eq!(status_before, FieldStatus::Committing);
            }

            // 4. single flight
            prop_assert_eq!(h.field.in_flight().is_some(), status == FieldStatus::Committing);
            prop_assert_eq!(h.pending.is_some(), status == FieldStatus::Committing);

            // 5. classes follow status
            let decision = h.field.render();
            let classes = decision.classes();
            prop_assert_eq!(classes.contains("field-loading"), status == FieldStatus::Committing);
            prop_assert_eq!(classes.contains("field-invalid"), status == FieldStatus::Invalid);
            prop_assert!(classes.contains("field"));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// No-op edits never reach the update function
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn unchanged_exit_never_commits(value in value_strategy(), detour in value_strategy()) {
        let mut h = Harness::new(&value);
        h.field.activate();
        h.field.set_draft(&detour);
        h.field.set_draft(&value);
        prop_assert_eq!(h.field.blur(), FieldResponse::Updated);
        prop_assert_eq!(h.call_count(), 0);
        prop_assert_eq!(h.field.committed_value(), value.as_str());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Cancel always restores the committed value
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cancel_restores(value in value_strategy(), draft in value_strategy()) {
        let mut h = Harness::new(&value);
        h.field.activate();
        h.field.set_draft(&draft);
        h.field.cancel();
        prop_assert_eq!(h.field.status(), FieldStatus::Viewing);
        prop_assert_eq!(h.field.committed_value(), value.as_str());
        prop_assert_eq!(h.call_count(), 0);
    }
}
