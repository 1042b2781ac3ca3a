// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR epoll kqueue

//! Core traits for adding your business logic, using [dependency injection], into the
//! dedicated reactor thread [framework]. See [`RRTWorker`] and [`RRTWaker`].
//!
//! [dependency injection]: https://en.wikipedia.org/wiki/Dependency_injection
//! [framework]: super#thread-lifecycle

use crate::core::common::Continuation;

/// One iteration of work on the dedicated thread.
///
/// Implementations own the OS poller ([`mio::Poll`], [`epoll`], [`kqueue`]) and block in
/// it. The framework calls [`poll_once()`] in a loop until it returns
/// [`Continuation::Stop`].
///
/// # Contract
///
/// - Block until at least one source is ready (or a timeout elapses), then dispatch
///   everything that is ready.
/// - Return [`Continuation::Continue`] for retryable conditions like [`EINTR`].
/// - Return [`Continuation::Stop`] once the owner has asked the thread to exit, or when
///   the poller itself is broken.
///
/// Resources owned by the worker are released by its [`Drop`] impl, which runs on the
/// dedicated thread right after the loop exits.
///
/// [`EINTR`]: https://man7.org/linux/man-pages/man7/signal.7.html
/// [`epoll`]: https://man7.org/linux/man-pages/man7/epoll.7.html
/// [`kqueue`]: https://man.freebsd.org/cgi/man.cgi?kqueue
/// [`poll_once()`]: Self::poll_once
pub trait RRTWorker: Send + 'static {
    /// Runs one poll and dispatch cycle.
    fn poll_once(&mut self) -> Continuation;
}

/// Interrupts the dedicated thread while it is blocked in [`RRTWorker::poll_once()`].
///
/// Shared by every caller thread, so it must be [`Sync`]. Waking is best effort: if the
/// notification can't be delivered because one is already pending, the worker will
/// observe the pending one.
pub trait RRTWaker: Send + Sync + 'static {
    /// Makes the blocked poll return so the worker re-reads shared state.
    fn wake_and_unblock_dedicated_thread(&self);
}
