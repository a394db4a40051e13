#![forbid(unsafe_code)]

//! Recovery scopes.
//!
//! Code that catches panics itself opens a [`RecoveryScope`] around the call
//! it guards. Panic hooks run before unwinding starts, so they consult
//! [`is_active`] and leave such panics to the code that will recover them.
//! Scopes are per thread and nest.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as inside a recovering region until dropped.
#[derive(Debug)]
#[must_use = "the region ends when the scope is dropped"]
pub struct RecoveryScope {
    // Not Send: the scope belongs to the thread that opened it.
    _thread: PhantomData<*const ()>,
}

impl RecoveryScope {
    /// Open a scope on the current thread.
    pub fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            _thread: PhantomData,
        }
    }
}

impl Drop for RecoveryScope {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Whether a panic raised now on this thread will be caught and recovered.
pub fn is_active() -> bool {
    DEPTH.with(|depth| depth.get() > 0)
}
