#![forbid(unsafe_code)]

//! Focus and selection discipline.
//!
//! The state machine never touches the input directly. Entering `Editing`
//! emits `Seed`, `Focus`, `SelectAll` (in that order) and leaving it emits
//! `Release`; [`run_focus_effects`] executes those on whatever the host uses
//! as its input.

use super::machine::Effect;

/// Something that can hold keyboard focus and a text selection.
pub trait FocusTarget {
    /// Take keyboard focus.
    fn focus(&mut self);

    /// Select the entire text.
    fn select_all(&mut self);
}

/// Input surface driven by field effects.
pub trait EditSurface: FocusTarget {
    /// Replace the surface's text with the freshly seeded draft.
    fn seed(&mut self, value: &str);

    /// The input is going away; drop focus and selection.
    fn release(&mut self);
}

impl EditSurface for crate::draft::DraftInput {
    fn seed(&mut self, value: &str) {
        self.set_value(value);
    }

    fn release(&mut self) {
        self.release_focus();
    }
}

/// Execute the surface-related effects in emission order.
///
/// `Commit` effects are left for the caller.
pub fn run_focus_effects<S: EditSurface + ?Sized>(surface: &mut S, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::Seed(value) => surface.seed(value),
            Effect::Focus => surface.focus(),
            Effect::SelectAll => surface.select_all(),
            Effect::Release => surface.release(),
            Effect::Commit(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl FocusTarget for Recorder {
        fn focus(&mut self) {
            self.calls.push("focus".into());
        }

        fn select_all(&mut self) {
            self.calls.push("select_all".into());
        }
    }

    impl EditSurface for Recorder {
        fn seed(&mut self, value: &str) {
            self.calls.push(format!("seed:{value}"));
        }

        fn release(&mut self) {
            self.calls.push("release".into());
        }
    }

    #[test]
    fn effects_run_in_order() {
        let mut recorder = Recorder::default();
        run_focus_effects(
            &mut recorder,
            &[
                Effect::Seed("Room 1".into()),
                Effect::Focus,
                Effect::SelectAll,
            ],
        );
        assert_eq!(recorder.calls, ["seed:Room 1", "focus", "select_all"]);
    }

    #[test]
    fn release_is_forwarded() {
        let mut recorder = Recorder::default();
        run_focus_effects(&mut recorder, &[Effect::Release]);
        assert_eq!(recorder.calls, ["release"]);
    }
}
