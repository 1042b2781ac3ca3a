// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll kqueue syscall

//! Reusable infrastructure for running blocking readiness polling on a dedicated thread.
//!
//! # The shape of it
//!
//! One thread owns the OS poller and blocks in it (its idle state). Every other thread
//! talks to it through shared state plus a waker:
//!
//! ```text
//! caller threads                          dedicated thread
//! ┌─────────────────────┐                 ┌───────────────────────────────────┐
//! │ mutate shared state │                 │ loop {                            │
//! │ waker.wake_and_...()│ ──── byte ────► │   worker.poll_once()  // blocks   │
//! └─────────────────────┘                 │ } while Continue                  │
//!                                         │ TerminationGuard::drop()          │
//!                                         └───────────────────────────────────┘
//! ```
//!
//! You plug in business logic with two traits (see [`rrt_di_traits`]):
//!
//! | Trait        | Implemented by                    | Job                                 |
//! | :----------- | :-------------------------------- | :---------------------------------- |
//! | [`RRTWorker`]| the thing that owns the poller    | one iteration: poll, then dispatch  |
//! | [`RRTWaker`] | the thing that can interrupt it   | make the blocked [`syscall`] return |
//!
//! The worker and waker are created together because the waker must be registered with
//! the worker's poller before either is usable.
//!
//! # Thread lifecycle
//!
//! 1. [`WorkerThreadHandle::try_spawn()`] names and starts the thread, which runs
//!    [`run_worker_loop()`].
//! 2. The loop calls [`RRTWorker::poll_once()`] until it returns
//!    [`Continuation::Stop`].
//! 3. The owner asks the worker to stop (usually a flag plus [`RRTWaker`]), then calls
//!    [`WorkerThreadHandle::join()`] exactly once.
//! 4. [`TerminationGuard`] flips [`RRTLiveness`] to [`LivenessState::Terminated`] on
//!    exit, including exit by panic unwinding.
//!
//! [`Continuation::Stop`]: crate::Continuation::Stop
//! [`syscall`]: https://man7.org/linux/man-pages/man2/syscalls.2.html

// Attach sources.
pub mod rrt_di_traits;
pub mod rrt_liveness;
pub mod rrt_termination_guard;
pub mod rrt_worker_thread;

// Re-export.
pub use rrt_di_traits::*;
pub use rrt_liveness::*;
pub use rrt_termination_guard::*;
pub use rrt_worker_thread::*;
