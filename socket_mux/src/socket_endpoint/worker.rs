// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR epoll wakeup

//! The endpoint's dedicated thread. See [`EndpointWorker`].

use super::{EndpointShared, SocketBackend, SocketPairWaker, SourceRegistry,
            dispatcher::{collect_ready_sources, dispatch},
            try_create_wakeup_channel};
use crate::{Continuation, core::reactor_thread::RRTWorker};
use miette::Diagnostic;
use mio::{Events, Poll};
use std::{io::ErrorKind, sync::Arc, time::Duration};

/// [`mio`]-based worker that owns the poll set for every registered socket plus the
/// receive side of the wakeup channel.
///
/// # Resources Managed
///
/// | Resource                | Purpose                                         |
/// | :---------------------- | :---------------------------------------------- |
/// | [`poll_handle`]         | epoll/kqueue instance                           |
/// | [`sources`]             | What is currently registered with it            |
/// | [`wakeup_receiver`]     | Receive side of the wakeup channel              |
/// | [`read_buffer`]         | Scratch space for one read chunk                |
///
/// [`poll_handle`]: Self::poll_handle
/// [`read_buffer`]: Self::read_buffer
/// [`sources`]: Self::sources
/// [`wakeup_receiver`]: Self::wakeup_receiver
#[allow(missing_debug_implementations)]
pub struct EndpointWorker<B: SocketBackend> {
    pub shared: Arc<EndpointShared<B>>,

    pub poll_handle: Poll,

    /// Buffer for events returned by [`Poll::poll()`].
    pub ready_events_buffer: Events,

    pub sources: SourceRegistry,

    /// [`None`] when the wakeup channel could not be created (degraded mode).
    pub wakeup_receiver: Option<B::Handle>,

    pub read_buffer: Vec<u8>,

    /// [`None`] blocks until something is ready. Only set in degraded mode.
    pub poll_timeout: Option<Duration>,
}

impl<B: SocketBackend> EndpointWorker<B> {
    /// Creates the worker and the matching waker together, since the waker's receive
    /// side has to be registered with this worker's [`Poll`].
    ///
    /// A wakeup channel that can't be created is not fatal: the worker falls back to
    /// polling with [`degraded_poll_timeout`] and no waker is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PollCreationError`] if the OS poller can't be created.
    ///
    /// [`degraded_poll_timeout`]: super::EndpointConfig::degraded_poll_timeout
    pub fn try_create(
        shared: Arc<EndpointShared<B>>,
    ) -> miette::Result<(Self, Option<SocketPairWaker<B>>)> {
        let poll_handle = Poll::new().map_err(PollCreationError)?;

        let (wakeup_receiver, waker) =
            match try_create_wakeup_channel(&shared.backend, poll_handle.registry()) {
                Ok((receiver, waker)) => (Some(receiver), Some(waker)),
                Err(e) => {
                    tracing::warn!(
                        message = "socket endpoint: no wakeup channel, running degraded",
                        error = ?e,
                        poll_timeout = ?shared.config.degraded_poll_timeout
                    );
                    (None, None)
                }
            };

        let poll_timeout = waker
            .is_none()
            .then_some(shared.config.degraded_poll_timeout);

        let worker = Self {
            poll_handle,
            ready_events_buffer: Events::with_capacity(shared.config.events_capacity),
            sources: SourceRegistry::default(),
            wakeup_receiver,
            read_buffer: vec![0u8; shared.config.read_chunk_size],
            poll_timeout,
            shared,
        };

        Ok((worker, waker))
    }

    /// Reconciles [`sources`] with both tables, under the registry lock.
    ///
    /// [`sources`]: Self::sources
    pub fn rebuild_poll_set(&mut self) {
        let tables = self.shared.registry.lock();
        self.sources
            .rebuild(self.poll_handle.registry(), tables.pollables());
    }
}

impl<B: SocketBackend> RRTWorker for EndpointWorker<B> {
    /// Performs one iteration of the poll loop: rebuild the poll set, block, dispatch.
    ///
    /// # Returns
    ///
    /// - [`Continuation::Continue`]: Processed events, or a retryable poll error.
    /// - [`Continuation::Stop`]: Abort was requested, or the poller failed.
    fn poll_once(&mut self) -> Continuation {
        if self.shared.is_abort_requested() {
            return Continuation::Stop;
        }

        self.rebuild_poll_set();

        // Block until a socket or the wakeup channel becomes ready.
        if let Err(err) = self
            .poll_handle
            .poll(&mut self.ready_events_buffer, self.poll_timeout)
        {
            // EINTR - retry (signal interrupted syscall).
            if err.kind() == ErrorKind::Interrupted {
                return Continuation::Continue;
            }

            tracing::error!(
                message = "socket endpoint: poll failed, worker exiting",
                error = ?err
            );
            return Continuation::Stop;
        }

        for ready in collect_ready_sources(&self.ready_events_buffer) {
            dispatch(self, ready);
            if self.shared.is_abort_requested() {
                return Continuation::Stop;
            }
        }

        Continuation::Continue
    }
}

impl<B: SocketBackend> Drop for EndpointWorker<B> {
    /// Closes the wakeup receive side. Runs on the worker thread as it exits.
    fn drop(&mut self) {
        if let Some(receiver) = self.wakeup_receiver.take() {
            self.shared.backend.close(receiver);
        }
        tracing::debug!(message = "socket endpoint: worker exited");
    }
}

// ╭──────────────────────────────────────────────────────────╮
// │ Diagnostic error types for worker creation failures      │
// ╰──────────────────────────────────────────────────────────╯

/// Failed to create [`mio::Poll`] (epoll/kqueue creation failed).
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Failed to create mio::Poll")]
#[diagnostic(
    code(r3bl_socket_mux::poll_creation),
    help("This usually means the system ran out of file descriptors")
)]
pub struct PollCreationError(#[source] pub std::io::Error);
