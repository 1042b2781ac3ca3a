// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// A unified type for indicating whether a loop or thread should continue processing or
/// stop. Used across:
/// - [`run_worker_loop()`] (the dedicated thread).
/// - [`EndpointWorker`] dispatch (one readiness event at a time).
///
/// [`EndpointWorker`]: crate::socket_endpoint::EndpointWorker
/// [`run_worker_loop()`]: crate::core::reactor_thread::run_worker_loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Continue to the next iteration.
    #[default]
    Continue,

    /// Stop processing and exit the loop/thread.
    Stop,
}

impl Continuation {
    /// Returns [`Continuation::Stop`] when `should_stop` is true.
    #[must_use]
    pub const fn stop_if(should_stop: bool) -> Self {
        if should_stop { Self::Stop } else { Self::Continue }
    }
}
