// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Spawning, running, and joining the dedicated thread. See [`WorkerThreadHandle`] and
//! [`run_worker_loop()`].

use super::{RRTLiveness, RRTWorker, TerminationGuard};
use crate::core::common::Continuation;
use miette::Diagnostic;
use std::{sync::Arc,
          thread::{JoinHandle, ThreadId}};

/// Failed to spawn the dedicated thread.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Failed to spawn the dedicated worker thread")]
#[diagnostic(
    code(r3bl_socket_mux::worker_spawn),
    help("The OS refused to create a new thread - check process thread limits")
)]
pub struct WorkerSpawnError(#[source] pub std::io::Error);

/// Owns the dedicated thread. Joining consumes the handle, so the thread is joined at
/// most once.
#[allow(missing_debug_implementations)]
pub struct WorkerThreadHandle {
    join_handle: JoinHandle<()>,
    liveness: Arc<RRTLiveness>,
}

impl WorkerThreadHandle {
    /// Spawns a named thread that drives `worker` via [`run_worker_loop()`].
    ///
    /// The thread is named `{thread_name}-gen-{generation}` so that log lines from
    /// different endpoints can be told apart.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerSpawnError`] if the OS can't create the thread. In that case
    /// `worker` is dropped on the calling thread.
    pub fn try_spawn<W: RRTWorker>(
        thread_name: &str,
        worker: W,
    ) -> miette::Result<Self> {
        let liveness = Arc::new(RRTLiveness::new());
        let liveness_clone = Arc::clone(&liveness);

        let join_handle = std::thread::Builder::new()
            .name(format!("{thread_name}-gen-{}", liveness.generation))
            .spawn(move || run_worker_loop(worker, liveness_clone))
            .map_err(WorkerSpawnError)?;

        Ok(Self {
            join_handle,
            liveness,
        })
    }

    #[must_use]
    pub fn thread_id(&self) -> ThreadId { self.join_handle.thread().id() }

    /// Joining from the dedicated thread itself would deadlock.
    #[must_use]
    pub fn is_current_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id()
    }

    #[must_use]
    pub fn liveness(&self) -> Arc<RRTLiveness> { Arc::clone(&self.liveness) }

    /// Blocks until the dedicated thread exits. A panic on the dedicated thread is
    /// logged, not propagated.
    pub fn join(self) {
        if let Err(panic_payload) = self.join_handle.join() {
            tracing::error!(
                message = "dedicated thread panicked",
                payload = ?panic_payload.downcast_ref::<&str>()
            );
        }
    }
}

/// Body of the dedicated thread.
///
/// Calls [`RRTWorker::poll_once()`] until it returns [`Continuation::Stop`]. The worker
/// is dropped (releasing its OS resources) before [`TerminationGuard`] reports the
/// thread as terminated.
pub fn run_worker_loop(mut worker: impl RRTWorker, liveness: Arc<RRTLiveness>) {
    let _guard = TerminationGuard { liveness };
    while worker.poll_once() == Continuation::Continue {}
    drop(worker);
    // _guard dropped here (or during unwinding), calling mark_terminated()
}
