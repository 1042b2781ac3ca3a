// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words wakeup

//! The public face of the multiplexer. See [`SocketEndpoint`].

use super::{Client, ConnectionId, EndpointConfig, EndpointShared, EndpointWorker,
            FlushOutcome, Listener, NativeSocketBackend, SocketBackend, SocketPairWaker,
            downgrade_client, downgrade_listener, is_same_allocation};
use crate::core::reactor_thread::{LivenessState, RRTLiveness, RRTWaker,
                                  WorkerThreadHandle};
use std::sync::Arc;

/// Manages many outbound and listening sockets with one dedicated worker thread.
///
/// Every method is safe to call from any thread, including from inside a [`Client`] or
/// [`Listener`] callback. Nothing blocks on I/O except the worker's own poll.
///
/// ```no_run
/// use r3bl_socket_mux::{Client, ConnectionId, SocketEndpoint};
/// use std::sync::Arc;
///
/// struct Printer;
/// impl Client for Printer {
///     fn did_receive(&self, id: ConnectionId, bytes: Vec<u8>) {
///         println!("{id}: {}", String::from_utf8_lossy(&bytes));
///     }
///     fn did_close(&self, id: ConnectionId) { println!("{id}: closed"); }
/// }
///
/// let endpoint = SocketEndpoint::try_new_default().unwrap();
/// let client = Arc::new(Printer);
/// if let Some(id) = endpoint.connect_inet("127.0.0.1", 9222, &client) {
///     endpoint.send(id, b"hello");
/// }
/// // Dropping the endpoint joins the worker and closes every socket.
/// ```
///
/// # Teardown
///
/// [`Drop`] sets the abort flag, wakes the worker, joins it, closes the wakeup channel,
/// then closes every remaining socket. No callbacks fire during teardown.
#[allow(missing_debug_implementations)]
pub struct SocketEndpoint<B: SocketBackend = NativeSocketBackend> {
    shared: Arc<EndpointShared<B>>,
    /// [`None`] in degraded mode.
    waker: Option<SocketPairWaker<B>>,
    /// [`None`] once joined.
    worker_thread: Option<WorkerThreadHandle>,
    liveness: Arc<RRTLiveness>,
}

impl SocketEndpoint<NativeSocketBackend> {
    /// Endpoint over real sockets with [`EndpointConfig::default()`].
    ///
    /// # Errors
    ///
    /// See [`SocketEndpoint::try_new()`].
    pub fn try_new_default() -> miette::Result<Self> {
        Self::try_new(NativeSocketBackend, EndpointConfig::default())
    }
}

impl<B: SocketBackend> SocketEndpoint<B> {
    /// Creates the poller and wakeup channel, then spawns the worker thread.
    ///
    /// # Errors
    ///
    /// - [`PollCreationError`] if the OS poller can't be created.
    /// - [`WorkerSpawnError`] if the thread can't be spawned.
    ///
    /// Failing to create the wakeup channel is not an error; see
    /// [`is_degraded()`].
    ///
    /// [`PollCreationError`]: super::PollCreationError
    /// [`WorkerSpawnError`]: crate::WorkerSpawnError
    /// [`is_degraded()`]: Self::is_degraded
    pub fn try_new(backend: B, config: EndpointConfig) -> miette::Result<Self> {
        let thread_name = config.worker_thread_name.clone();
        let shared = Arc::new(EndpointShared::new(Arc::new(backend), config));

        let (worker, waker) = EndpointWorker::try_create(Arc::clone(&shared))?;
        let worker_thread = WorkerThreadHandle::try_spawn(&thread_name, worker)?;
        let _unused = shared.worker_thread_id.set(worker_thread.thread_id());
        let liveness = worker_thread.liveness();

        tracing::debug!(
            message = "socket endpoint: started",
            generation = liveness.generation,
            is_degraded = waker.is_none()
        );

        Ok(Self {
            shared,
            waker,
            worker_thread: Some(worker_thread),
            liveness,
        })
    }

    /// Opens an outbound connection and registers it under `client`.
    ///
    /// Returns [`None`] (creating nothing, calling nothing) if the connection can't be
    /// established.
    ///
    /// Name resolution and the connect run on the calling thread and block it. With
    /// [`NativeSocketBackend`] each resolved address gets at most [`CONNECT_TIMEOUT`].
    ///
    /// [`NativeSocketBackend`]: super::NativeSocketBackend
    /// [`CONNECT_TIMEOUT`]: super::CONNECT_TIMEOUT
    pub fn connect_inet<C: Client>(
        &self,
        address: &str,
        port: u16,
        client: &Arc<C>,
    ) -> Option<ConnectionId> {
        match self.shared.backend.connect(address, port) {
            Ok(socket) => self.create_client(socket, client),
            Err(e) => {
                tracing::debug!(
                    message = "socket endpoint: connect failed",
                    address,
                    port,
                    error = ?e
                );
                None
            }
        }
    }

    /// Adopts an already connected socket as an active connection under `client`.
    ///
    /// Runs [`SocketBackend::setup()`] first; if that fails the socket is closed and
    /// [`None`] is returned.
    pub fn create_client<C: Client>(
        &self,
        socket: B::Handle,
        client: &Arc<C>,
    ) -> Option<ConnectionId> {
        if let Err(e) = self.shared.backend.setup(&socket) {
            tracing::debug!(message = "socket endpoint: setup failed", error = ?e);
            self.shared.backend.close(socket);
            return None;
        }

        let id = self
            .shared
            .registry
            .lock()
            .insert_active(socket, downgrade_client(client));
        self.wake();
        Some(id)
    }

    /// Binds and listens on `address:port` (port `0` picks an ephemeral port, see
    /// [`get_port()`]). Accepted peers become active connections under `client`, after
    /// `listener` approves them.
    ///
    /// [`get_port()`]: Self::get_port
    pub fn listen_inet<L: Listener, C: Client>(
        &self,
        address: &str,
        port: u16,
        listener: &Arc<L>,
        client: &Arc<C>,
    ) -> Option<ConnectionId> {
        let socket = match self.shared.backend.listen(address, port) {
            Ok(socket) => socket,
            Err(e) => {
                tracing::debug!(
                    message = "socket endpoint: listen failed",
                    address,
                    port,
                    error = ?e
                );
                return None;
            }
        };

        if let Err(e) = self.shared.backend.setup(&socket) {
            tracing::debug!(message = "socket endpoint: setup failed", error = ?e);
            self.shared.backend.close(socket);
            return None;
        }

        let id = self.shared.registry.lock().insert_listening(
            socket,
            downgrade_listener(listener),
            downgrade_client(client),
        );
        self.wake();
        Some(id)
    }

    /// True only for entries in the listening table.
    #[must_use]
    pub fn is_listening(&self, id: ConnectionId) -> bool {
        self.shared.registry.lock().is_listening(id)
    }

    /// Bound local port of an entry in either table.
    #[must_use]
    pub fn get_port(&self, id: ConnectionId) -> Option<u16> {
        let tables = self.shared.registry.lock();
        tables
            .get(id)
            .and_then(|connection| self.shared.backend.get_port(&connection.socket))
    }

    /// Queues `bytes` on the active connection `id`. Unknown ids are ignored.
    ///
    /// If nothing is queued yet, as much as the socket takes is written right away and
    /// only the remainder is queued. If something is already queued, `bytes` go behind
    /// it without a write attempt, so peers see bytes in call order.
    pub fn send(&self, id: ConnectionId, bytes: &[u8]) {
        let should_wake = {
            let mut tables = self.shared.registry.lock();
            let Some(connection) = tables.get_active_mut(id) else {
                return;
            };

            let was_empty = connection.outbound.is_empty();
            connection.outbound.extend_from_slice(bytes);
            if !was_empty {
                return;
            }

            match connection.flush_outbound(self.shared.backend.as_ref()) {
                FlushOutcome::Drained => false,
                FlushOutcome::Pending => true,
                FlushOutcome::Failed(e) => {
                    tracing::debug!(
                        message = "socket endpoint: write error",
                        id = %id,
                        error = ?e
                    );
                    false
                }
            }
        };

        if should_wake {
            self.wake();
        }
    }

    /// Closes every active connection registered under `client`, without calling
    /// [`Client::did_close()`]. When this returns no callback for those connections is
    /// running or will run (unless called from inside a callback, where the current one
    /// is still on the stack).
    pub fn invalidate_client<C: Client + ?Sized>(&self, client: &Arc<C>) {
        let closed = {
            let mut tables = self.shared.registry.lock();
            let removed =
                tables.remove_active_where(|it| is_same_allocation(&it.client, client));
            self.shared.close_connections(removed)
        };
        self.shared.wait_for_in_flight_callbacks();
        self.wake();
        tracing::debug!(message = "socket endpoint: client invalidated", closed);
    }

    /// Closes every listening entry registered with `listener`. Same guarantees as
    /// [`invalidate_client()`].
    ///
    /// [`invalidate_client()`]: Self::invalidate_client
    pub fn invalidate_listener<L: Listener + ?Sized>(&self, listener: &Arc<L>) {
        let closed = {
            let mut tables = self.shared.registry.lock();
            let removed = tables.remove_listening_where(|it| {
                it.listener
                    .as_ref()
                    .is_some_and(|weak| is_same_allocation(weak, listener))
            });
            self.shared.close_connections(removed)
        };
        self.shared.wait_for_in_flight_callbacks();
        self.wake();
        tracing::debug!(message = "socket endpoint: listener invalidated", closed);
    }

    #[must_use]
    pub fn connection_count(&self) -> usize { self.shared.registry.lock().active_count() }

    #[must_use]
    pub fn listener_count(&self) -> usize { self.shared.registry.lock().listening_count() }

    #[must_use]
    pub fn is_worker_running(&self) -> LivenessState { self.liveness.is_running() }

    /// Outlives the endpoint, so callers can check the worker exited after teardown.
    #[must_use]
    pub fn worker_liveness(&self) -> Arc<RRTLiveness> { Arc::clone(&self.liveness) }

    /// True when the wakeup channel could not be created and the worker polls with
    /// [`degraded_poll_timeout`] instead.
    ///
    /// [`degraded_poll_timeout`]: EndpointConfig::degraded_poll_timeout
    #[must_use]
    pub fn is_degraded(&self) -> bool { self.waker.is_none() }

    #[must_use]
    pub fn backend(&self) -> Arc<B> { Arc::clone(&self.shared.backend) }

    #[must_use]
    pub fn config(&self) -> &EndpointConfig { &self.shared.config }

    fn wake(&self) {
        if let Some(waker) = &self.waker {
            waker.wake_and_unblock_dedicated_thread();
        }
    }
}

impl<B: SocketBackend> Drop for SocketEndpoint<B> {
    fn drop(&mut self) {
        self.shared.request_abort();
        self.wake();

        if let Some(worker_thread) = self.worker_thread.take() {
            if worker_thread.is_current_thread() {
                // Dropped from inside a callback. The worker sees the abort flag as soon
                // as the callback returns.
                tracing::warn!(
                    message = "socket endpoint: dropped on its own worker thread, not joining"
                );
            } else {
                worker_thread.join();
            }
        }

        drop(self.waker.take());

        let remaining = self.shared.registry.lock().drain_all();
        let closed = self.shared.close_connections(remaining);

        tracing::debug!(message = "socket endpoint: stopped", closed);
    }
}
