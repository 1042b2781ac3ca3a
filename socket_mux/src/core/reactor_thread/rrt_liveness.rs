// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Thread liveness tracking for the dedicated reactor thread. See [`RRTLiveness`] and
//! [`LivenessState`].

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Counter for thread generations. Incremented each time a new thread is spawned.
///
/// The actual value has no semantic meaning - it's just a counter. Tests compare
/// generations to detect whether two endpoints share a thread (they never should).
///
/// Wraps naturally from `255` → `0`.
static THREAD_GENERATION: AtomicU8 = AtomicU8::new(0);

/// A tracker for thread liveness state and incarnation generation.
///
/// - [`is_running`]: Current liveness (mutable via [`mark_terminated()`])
/// - [`generation`]: Which incarnation of the thread (immutable)
///
/// # Why [`AtomicBool`] Instead of [`Mutex<bool>`]?
///
/// [`is_running()`] is queried from caller threads that may already hold the connection
/// registry lock. [`AtomicBool`] is [lock-free], so no lock ordering needs to be
/// considered. All atomic operations use [`SeqCst`] ordering.
///
/// [`Mutex<bool>`]: std::sync::Mutex
/// [`SeqCst`]: std::sync::atomic::Ordering::SeqCst
/// [`generation`]: Self::generation
/// [`is_running()`]: Self::is_running
/// [`is_running`]: Self::is_running
/// [`mark_terminated()`]: Self::mark_terminated
/// [lock-free]: https://en.wikipedia.org/wiki/Non-blocking_algorithm
#[allow(missing_debug_implementations)]
pub struct RRTLiveness {
    /// Whether the thread is currently running. Set to `false` by [`mark_terminated()`].
    ///
    /// [`mark_terminated()`]: Self::mark_terminated
    pub is_running: AtomicBool,

    /// Thread generation number. Immutable after creation.
    pub generation: u8,
}

impl RRTLiveness {
    /// Creates new liveness in the [`Running`] state with a fresh generation.
    ///
    /// [`Running`]: LivenessState::Running
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_running: AtomicBool::new(true),
            generation: THREAD_GENERATION
                .fetch_add(1, Ordering::SeqCst)
                .wrapping_add(1),
        }
    }

    /// Marks the thread as terminated. Called by [`TerminationGuard`] when the dedicated
    /// thread exits.
    ///
    /// [`TerminationGuard`]: super::TerminationGuard
    pub fn mark_terminated(&self) { self.is_running.store(false, Ordering::SeqCst); }

    /// Checks if the thread is currently running.
    #[must_use]
    pub fn is_running(&self) -> LivenessState {
        if self.is_running.load(Ordering::SeqCst) {
            LivenessState::Running
        } else {
            LivenessState::Terminated
        }
    }
}

impl Default for RRTLiveness {
    fn default() -> Self { Self::new() }
}

/// An indication of whether the dedicated thread is running or terminated.
///
/// Used by [`RRTLiveness::is_running()`] to provide a self-documenting return type
/// instead of a bare `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    /// The dedicated thread is running and processing events.
    Running,
    /// The dedicated thread has exited or was never started.
    Terminated,
}
