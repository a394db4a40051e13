#![forbid(unsafe_code)]

//! Edit state machine.
//!
//! The lifecycle is a single tagged state. The draft value lives inside the
//! `Editing` and `Committing` variants only, so "draft present while viewing"
//! or "loading while editing" cannot be represented.
//!
//! ```text
//!            activate                 exit (changed)
//!  Viewing ───────────▶ Editing ─────────────────────▶ Committing
//!     ▲  ▲                │  │                          │      │
//!     │  └── cancel ──────┘  │ exit (unchanged)         │      │ rejected
//!     │  └───────────────────┘                          │      ▼
//!     │◀──────────────────── committed ─────────────────┘   Invalid
//!     │◀──────────────────── frame presented ──────────────────┘
//! ```
//!
//! [`EditState::transition`] is pure. [`EditMachine`] wraps it with the
//! committed value, the buffered external value and the ticket counter.

use super::commit::{
    CommitOutcome, CommitRequest, CommitTicket, FieldId, FieldKey, FieldPayload,
};

/// Coarse status, as seen by presentation and hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldStatus {
    /// Showing the committed value.
    Viewing,
    /// The user is editing a draft.
    Editing,
    /// A commit is in flight.
    Committing,
    /// The last commit was rejected; shown for one frame.
    Invalid,
}

/// Full lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    /// Showing the committed value.
    #[default]
    Viewing,
    /// The user is editing.
    Editing {
        /// Current draft.
        draft: String,
    },
    /// Waiting for the commit named by `ticket`.
    Committing {
        /// The value being written.
        draft: String,
        /// The in-flight commit.
        ticket: CommitTicket,
    },
    /// The commit was rejected; cleared after one presented frame.
    Invalid,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// Pointer or programmatic request to start editing.
    Activate,
    /// The draft text changed.
    DraftChanged(String),
    /// Escape.
    Cancel,
    /// Blur or Enter.
    Exit,
    /// A commit finished.
    Resolved {
        /// Which commit.
        ticket: CommitTicket,
        /// How it went.
        outcome: CommitOutcome,
    },
    /// The host presented a frame.
    FramePresented,
}

impl FieldEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::DraftChanged(_) => "draft_changed",
            Self::Cancel => "cancel",
            Self::Exit => "exit",
            Self::Resolved { .. } => "resolved",
            Self::FramePresented => "frame_presented",
        }
    }
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load the draft into the input.
    Seed(String),
    /// Give the input keyboard focus.
    Focus,
    /// Select the input's entire text.
    SelectAll,
    /// The input lost its editing role; drop focus.
    Release,
    /// Run the commit pipeline.
    Commit(CommitRequest),
}

/// Read-only inputs a transition needs besides the state itself.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// Key of the field.
    pub key: &'a FieldKey,
    /// Current committed value.
    pub committed: &'a str,
    /// Ticket to use if this transition starts a commit.
    pub next_ticket: CommitTicket,
}

/// Result of [`EditState::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub state: EditState,
    /// Effects to execute, in order.
    pub effects: Vec<Effect>,
    /// New committed value, set only by a successful commit.
    pub committed: Option<String>,
    /// `false` when the event had no meaning in the current state.
    pub applied: bool,
}

impl Transition {
    fn to(state: EditState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            committed: None,
            applied: true,
        }
    }

    fn ignored(state: EditState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            committed: None,
            applied: false,
        }
    }

    fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }
}

impl EditState {
    /// Coarse status of this state.
    pub fn status(&self) -> FieldStatus {
        match self {
            Self::Viewing => FieldStatus::Viewing,
            Self::Editing { .. } => FieldStatus::Editing,
            Self::Committing { .. } => FieldStatus::Committing,
            Self::Invalid => FieldStatus::Invalid,
        }
    }

    /// The draft, present only while editing or committing.
    pub fn draft(&self) -> Option<&str> {
        match self {
            Self::Editing { draft } | Self::Committing { draft, .. } => Some(draft),
            Self::Viewing | Self::Invalid => None,
        }
    }

    /// Compute the next state for `event`.
    pub fn transition(self, cx: &TransitionContext<'_>, event: FieldEvent) -> Transition {
        match (self, event) {
            (Self::Viewing, FieldEvent::Activate) => {
                let draft = cx.committed.to_string();
                Transition::to(Self::Editing {
                    draft: draft.clone(),
                })
                .with_effects(vec![Effect::Seed(draft), Effect::Focus, Effect::SelectAll])
            }

            (Self::Editing { .. }, FieldEvent::DraftChanged(draft)) => {
                Transition::to(Self::Editing { draft })
            }

            (Self::Editing { .. }, FieldEvent::Cancel) => {
                Transition::to(Self::Viewing).with_effects(vec![Effect::Release])
            }

            (Self::Editing { draft }, FieldEvent::Exit) => {
                if draft == cx.committed {
                    return Transition::to(Self::Viewing).with_effects(vec![Effect::Release]);
                }
                let request = CommitRequest {
                    ticket: cx.next_ticket,
                    payload: FieldPayload::new(cx.key.clone(), draft.clone()),
                };
                Transition::to(Self::Committing {
                    draft,
                    ticket: cx.next_ticket,
                })
                .with_effects(vec![Effect::Release, Effect::Commit(request)])
            }

            (Self::Committing { draft, ticket }, FieldEvent::Resolved { ticket: got, outcome })
                if got == ticket =>
            {
                match outcome {
                    CommitOutcome::Committed => {
                        let mut transition = Transition::to(Self::Viewing);
                        transition.committed = Some(draft);
                        transition
                    }
                    CommitOutcome::Rejected(_) => Transition::to(Self::Invalid),
                }
            }

            (Self::Invalid, FieldEvent::FramePresented) => Transition::to(Self::Viewing),

            (state, _) => Transition::ignored(state),
        }
    }
}

/// Stateful wrapper around [`EditState::transition`].
#[derive(Debug, Clone)]
pub struct EditMachine {
    id: FieldId,
    key: FieldKey,
    committed: String,
    state: EditState,
    /// Latest external value received while not viewing.
    pending_external: Option<String>,
    /// Sequence number of the last commit started.
    last_seq: u64,
}

impl EditMachine {
    /// Create a machine resting in `Viewing`.
    pub fn new(key: FieldKey, committed: impl Into<String>) -> Self {
        Self {
            id: FieldId::next(),
            key,
            committed: committed.into(),
            state: EditState::Viewing,
            pending_external: None,
            last_seq: 0,
        }
    }

    /// Identity of this field instance.
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Key of the edited property.
    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    /// Current state.
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Current status.
    pub fn status(&self) -> FieldStatus {
        self.state.status()
    }

    /// Last known-good value.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Draft, while editing or committing.
    pub fn draft(&self) -> Option<&str> {
        self.state.draft()
    }

    /// The commit currently in flight, if any.
    pub fn in_flight(&self) -> Option<CommitTicket> {
        match &self.state {
            EditState::Committing { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    /// External value waiting for the field to return to `Viewing`.
    pub fn pending_external(&self) -> Option<&str> {
        self.pending_external.as_deref()
    }

    /// Offer a new externally owned value.
    ///
    /// Adopted immediately while viewing (returns `true`); otherwise buffered,
    /// latest wins, until the field is back in `Viewing`.
    pub fn set_external(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.state == EditState::Viewing {
            self.committed = value;
            true
        } else {
            inedit_core::trace!(field = %self.id, "external value buffered");
            self.pending_external = Some(value);
            false
        }
    }

    /// Feed one event. Returns the effects to execute, empty if the event was
    /// ignored.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn step(&mut self, event: FieldEvent) -> Vec<Effect> {
        let from = self.status();
        let event_name = event.name();
        let cx = TransitionContext {
            key: &self.key,
            committed: &self.committed,
            next_ticket: CommitTicket {
                field: self.id,
                seq: self.last_seq + 1,
            },
        };
        let state = std::mem::take(&mut self.state);
        let transition = state.transition(&cx, event);

        self.state = transition.state;
        if !transition.applied {
            inedit_core::trace!(
                field = %self.id,
                event = event_name,
                status = ?from,
                "event ignored"
            );
            return Vec::new();
        }

        if let Some(committed) = transition.committed {
            self.committed = committed;
        }
        if transition
            .effects
            .iter()
            .any(|effect| matches!(effect, Effect::Commit(_)))
        {
            self.last_seq += 1;
        }
        if self.state == EditState::Viewing
            && let Some(external) = self.pending_external.take()
        {
            self.committed = external;
        }

        inedit_core::debug!(
            field = %self.id,
            key = %self.key,
            event = event_name,
            from = ?from,
            to = ?self.status(),
            "field transition"
        );
        transition.effects
    }
}
