#![forbid(unsafe_code)]

//! Commit pipeline.
//!
//! Adapts a caller-supplied update function into a single
//! [`CommitOutcome`]. Errors and panics raised by the update function both
//! become [`CommitOutcome::Rejected`]; nothing escapes to the host and nothing
//! is retried. The update call runs inside a [`RecoveryScope`] so panic hooks
//! can tell these panics from fatal ones.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use inedit_core::recovery::RecoveryScope;

use crate::error::FieldError;

/// Error type accepted from update functions.
pub type UpdateError = Box<dyn std::error::Error + Send + Sync>;

type UpdateFn = dyn Fn(&FieldPayload) -> Result<(), UpdateError> + Send + Sync;

/// Name of the externally owned property a field edits.
///
/// Non-empty and fixed for the lifetime of the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey(String);

impl FieldKey {
    /// Validate and wrap a key.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::EmptyKey`] if the key is empty or blank.
    pub fn new(key: impl Into<String>) -> Result<Self, FieldError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(FieldError::EmptyKey);
        }
        Ok(Self(key))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Process-unique identity of one field instance.
///
/// Two fields editing the same key still have distinct ids, so a commit
/// resolution can never be applied to a field that did not start it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u64);

impl FieldId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

/// Names one commit of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitTicket {
    /// Field that started the commit.
    pub field: FieldId,
    /// Per-field commit sequence number, starting at 1.
    pub seq: u64,
}

/// Single-entry mapping `{ key: value }` handed to the update function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPayload {
    key: FieldKey,
    value: String,
}

impl FieldPayload {
    /// Build a payload.
    pub fn new(key: FieldKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// The property being written.
    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    /// The new value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Look up the value by key, as with any map.
    pub fn get(&self, key: &str) -> Option<&str> {
        (self.key.as_str() == key).then_some(self.value.as_str())
    }

    /// Split into `(key, value)`.
    pub fn into_pair(self) -> (FieldKey, String) {
        (self.key, self.value)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FieldPayload {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key.as_str(), &self.value)?;
        map.end()
    }
}

/// A commit the host must run, either inline or on a background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Identifies the commit when its outcome is delivered back.
    pub ticket: CommitTicket,
    /// What to write.
    pub payload: FieldPayload,
}

/// Result of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The update function accepted the value.
    Committed,
    /// The update function failed or panicked. Carries its message.
    Rejected(String),
}

impl CommitOutcome {
    /// Whether this is [`CommitOutcome::Committed`].
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Wraps the caller's update function.
///
/// Cheap to clone; clones share the same function, which lets a host move a
/// copy onto a worker thread.
#[derive(Clone)]
pub struct CommitPipeline {
    update: Arc<UpdateFn>,
}

impl CommitPipeline {
    /// Wrap an update function.
    ///
    /// Any error type convertible into a boxed error works, including
    /// `String` and `&'static str`.
    pub fn new<F, E>(update: F) -> Self
    where
        F: Fn(&FieldPayload) -> Result<(), E> + Send + Sync + 'static,
        E: Into<UpdateError>,
    {
        Self {
            update: Arc::new(move |payload: &FieldPayload| -> Result<(), UpdateError> {
                update(payload).map_err(Into::into)
            }),
        }
    }

    /// Run the update function once and classify the result.
    ///
    /// Always returns; a panic in the update function is caught and reported
    /// as a rejection.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn commit(&self, request: &CommitRequest) -> CommitOutcome {
        let _span = inedit_core::debug_span!(
            "inedit.field.commit",
            field = %request.ticket.field,
            seq = request.ticket.seq,
            key = %request.payload.key()
        )
        .entered();

        let update = &self.update;
        let recovering = RecoveryScope::enter();
        let outcome = match catch_unwind(AssertUnwindSafe(|| update(&request.payload))) {
            Ok(Ok(())) => CommitOutcome::Committed,
            Ok(Err(err)) => CommitOutcome::Rejected(err.to_string()),
            Err(payload) => CommitOutcome::Rejected(panic_message(payload.as_ref())),
        };
        drop(recovering);

        match &outcome {
            CommitOutcome::Committed => {
                inedit_core::debug!("commit accepted");
            }
            CommitOutcome::Rejected(reason) => {
                inedit_core::debug!(reason = %reason, "commit rejected");
            }
        }
        outcome
    }
}

impl fmt::Debug for CommitPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitPipeline")
            .field("update", &"<dyn Fn>")
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "update function panicked".to_string()
    }
}
