// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! State shared between caller threads and the worker thread. See [`EndpointShared`].

use super::{Connection, ConnectionRegistry, EndpointConfig, SocketBackend};
use std::{sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError,
                 atomic::{AtomicBool, Ordering}},
          thread::ThreadId};

/// Everything both sides of the endpoint touch.
///
/// # Callback barrier
///
/// The worker takes [`callback_barrier`] *before* releasing the registry lock and holds
/// it for the duration of a callback. Invalidation removes entries under the registry
/// lock, releases it, then takes the barrier once. So when
/// [`wait_for_in_flight_callbacks()`] returns, any callback for a removed entry has
/// finished and no new one can start.
///
/// On the worker thread (a callback invalidating) the wait is skipped, since that thread
/// already holds the barrier.
///
/// [`callback_barrier`]: Self::callback_barrier
/// [`wait_for_in_flight_callbacks()`]: Self::wait_for_in_flight_callbacks
#[allow(missing_debug_implementations)]
pub struct EndpointShared<B: SocketBackend> {
    pub backend: Arc<B>,
    pub registry: ConnectionRegistry<B::Handle>,
    pub abort_requested: AtomicBool,
    pub callback_barrier: Mutex<()>,
    /// Set once, right after the worker thread is spawned.
    pub worker_thread_id: OnceLock<ThreadId>,
    pub config: EndpointConfig,
}

impl<B: SocketBackend> EndpointShared<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, config: EndpointConfig) -> Self {
        Self {
            backend,
            registry: ConnectionRegistry::new(),
            abort_requested: AtomicBool::new(false),
            callback_barrier: Mutex::new(()),
            worker_thread_id: OnceLock::new(),
            config,
        }
    }

    pub fn request_abort(&self) { self.abort_requested.store(true, Ordering::SeqCst); }

    #[must_use]
    pub fn is_abort_requested(&self) -> bool { self.abort_requested.load(Ordering::SeqCst) }

    #[must_use]
    pub fn is_on_worker_thread(&self) -> bool {
        self.worker_thread_id
            .get()
            .is_some_and(|id| *id == std::thread::current().id())
    }

    /// Worker side of the callback barrier.
    pub fn enter_callback(&self) -> MutexGuard<'_, ()> {
        self.callback_barrier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller side of the callback barrier. Must not be called with the registry lock
    /// held.
    pub fn wait_for_in_flight_callbacks(&self) {
        if self.is_on_worker_thread() {
            return;
        }
        drop(self.enter_callback());
    }

    pub fn close_connection(&self, connection: Connection<B::Handle>) {
        self.backend.close(connection.socket);
    }

    pub fn close_connections(&self, connections: Vec<Connection<B::Handle>>) -> usize {
        let count = connections.len();
        for connection in connections {
            self.close_connection(connection);
        }
        count
    }
}
