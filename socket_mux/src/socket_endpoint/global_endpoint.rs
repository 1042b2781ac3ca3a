// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Process-wide endpoint behind an explicit, synchronized lazy container. See
//! [`GlobalSocketEndpoint`].

use super::SocketEndpoint;
use std::sync::{Arc, Mutex, PoisonError};

/// The process-wide endpoint, for callers that don't own one themselves.
///
/// ```no_run
/// use r3bl_socket_mux::GLOBAL_SOCKET_ENDPOINT;
/// let endpoint = GLOBAL_SOCKET_ENDPOINT.get_or_try_init().unwrap();
/// assert!(endpoint.connection_count() == 0);
/// ```
pub static GLOBAL_SOCKET_ENDPOINT: GlobalSocketEndpoint = GlobalSocketEndpoint::new();

/// A `const`-constructible container that builds a [`SocketEndpoint`] on first use and
/// hands out shared references to it.
///
/// [`shutdown()`] takes the endpoint out; it is torn down when the last [`Arc`] handed
/// out by [`get_or_try_init()`] is dropped. The next [`get_or_try_init()`] builds a fresh
/// one.
///
/// [`get_or_try_init()`]: Self::get_or_try_init
/// [`shutdown()`]: Self::shutdown
#[allow(missing_debug_implementations)]
pub struct GlobalSocketEndpoint {
    inner: Mutex<Option<Arc<SocketEndpoint>>>,
}

impl GlobalSocketEndpoint {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// # Errors
    ///
    /// See [`SocketEndpoint::try_new()`]. Nothing is stored on failure, so the next call
    /// tries again.
    pub fn get_or_try_init(&self) -> miette::Result<Arc<SocketEndpoint>> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(endpoint) = guard.as_ref() {
            return Ok(Arc::clone(endpoint));
        }

        let endpoint = Arc::new(SocketEndpoint::try_new_default()?);
        guard.replace(Arc::clone(&endpoint));
        Ok(endpoint)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns `true` if there was an endpoint to take out. If nobody else holds it, it
    /// is torn down before this returns.
    pub fn shutdown(&self) -> bool {
        let taken = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // Drop outside the lock; teardown joins the worker thread.
        let was_initialized = taken.is_some();
        drop(taken);
        was_initialized
    }
}

impl Default for GlobalSocketEndpoint {
    fn default() -> Self { Self::new() }
}
