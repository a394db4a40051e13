#![forbid(unsafe_code)]

//! Simulated room store.
//!
//! Stands in for a remote settings service: every write sleeps for the
//! configured latency, then validates and stores the value. Writes run on
//! the runtime's task threads, so the store is shared behind an `Arc`.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use inedit_widgets::FieldPayload;
use tracing::{debug, info};

/// Field key of the room name.
pub const NAME_KEY: &str = "name";
/// Field key of the lobby greeting.
pub const GREETING_KEY: &str = "greeting";

/// Persisted room settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomRecord {
    /// Room name.
    pub name: String,
    /// Lobby greeting.
    pub greeting: String,
}

/// Why the store refused a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Room names cannot be blank.
    EmptyName,
    /// Room name longer than the limit, in characters.
    NameTooLong { len: usize, max: usize },
    /// The payload names a setting the store does not have.
    UnknownKey(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "room name must not be empty"),
            Self::NameTooLong { len, max } => {
                write!(f, "room name is {len} characters, the limit is {max}")
            }
            Self::UnknownKey(key) => write!(f, "unknown setting {key:?}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Thread-safe store with artificial latency.
#[derive(Debug)]
pub struct RoomStore {
    record: Mutex<RoomRecord>,
    latency: Duration,
    max_name_len: usize,
    writes: AtomicUsize,
}

impl RoomStore {
    /// Store holding `record`.
    pub fn new(record: RoomRecord, latency: Duration, max_name_len: usize) -> Self {
        Self {
            record: Mutex::new(record),
            latency,
            max_name_len,
            writes: AtomicUsize::new(0),
        }
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> RoomRecord {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Accepted writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Longest accepted room name, in characters.
    pub fn max_name_len(&self) -> usize {
        self.max_name_len
    }

    /// Write one setting. Blocks for the store's latency first.
    pub fn apply(&self, payload: &FieldPayload) -> Result<(), StoreError> {
        if let Ok(json) = serde_json::to_string(payload) {
            debug!(payload = %json, latency_ms = self.latency.as_millis() as u64, "room write");
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        let value = payload.value();
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        match payload.key().as_str() {
            NAME_KEY => {
                if value.trim().is_empty() {
                    return Err(StoreError::EmptyName);
                }
                let len = value.chars().count();
                if len > self.max_name_len {
                    return Err(StoreError::NameTooLong {
                        len,
                        max: self.max_name_len,
                    });
                }
                record.name = value.to_string();
            }
            GREETING_KEY => record.greeting = value.to_string(),
            other => return Err(StoreError::UnknownKey(other.to_string())),
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        info!(key = %payload.key(), "room updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inedit_widgets::FieldKey;

    fn store() -> RoomStore {
        RoomStore::new(
            RoomRecord {
                name: "Room 1".into(),
                greeting: "Welcome".into(),
            },
            Duration::ZERO,
            8,
        )
    }

    fn payload(key: &str, value: &str) -> FieldPayload {
        FieldPayload::new(FieldKey::new(key).unwrap(), value)
    }

    #[test]
    fn accepts_valid_name() {
        let s = store();
        assert_eq!(s.apply(&payload(NAME_KEY, "Room 2")), Ok(()));
        assert_eq!(s.snapshot().name, "Room 2");
        assert_eq!(s.writes(), 1);
    }

    #[test]
    fn rejects_blank_name() {
        let s = store();
        assert_eq!(s.apply(&payload(NAME_KEY, "  ")), Err(StoreError::EmptyName));
        assert_eq!(s.snapshot().name, "Room 1");
        assert_eq!(s.writes(), 0);
    }

    #[test]
    fn rejects_long_name_by_chars() {
        let s = store();
        assert_eq!(s.apply(&payload(NAME_KEY, "ñññññññ")), Ok(()));
        assert_eq!(
            s.apply(&payload(NAME_KEY, "123456789")),
            Err(StoreError::NameTooLong { len: 9, max: 8 })
        );
    }

    #[test]
    fn greeting_may_be_empty() {
        let s = store();
        assert_eq!(s.apply(&payload(GREETING_KEY, "")), Ok(()));
        assert_eq!(s.snapshot().greeting, "");
    }

    #[test]
    fn unknown_key_is_refused() {
        let s = store();
        let err = s.apply(&payload("topic", "x")).unwrap_err();
        assert_eq!(err.to_string(), "unknown setting \"topic\"");
    }

    #[test]
    fn error_messages() {
        assert_eq!(StoreError::EmptyName.to_string(), "room name must not be empty");
        assert_eq!(
            StoreError::NameTooLong { len: 30, max: 24 }.to_string(),
            "room name is 30 characters, the limit is 24"
        );
    }
}
