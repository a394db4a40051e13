#![forbid(unsafe_code)]

//! Logging shims.
//!
//! With the `tracing` feature the macros below are re-exports of `tracing`.
//! Without it they expand to nothing, so library code can log unconditionally
//! as `inedit_core::debug!(...)`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op debug_span macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }

    /// No-op info macro when tracing is disabled.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

/// Span stand-in returned by `debug_span!` when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Mirrors `tracing::Span::entered`.
    #[must_use]
    pub fn entered(self) -> NoopGuard {
        NoopGuard
    }
}

/// Guard returned by [`NoopSpan::entered`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;
