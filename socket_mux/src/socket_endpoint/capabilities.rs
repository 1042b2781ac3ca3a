// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Callback capabilities implemented by whoever consumes the endpoint. See [`Client`]
//! and [`Listener`].
//!
//! The endpoint never owns these. It stores [`Weak`] references, so dropping the last
//! [`Arc`] to a client silences it even without [`invalidate_client()`]. Identity (for
//! invalidation) is the address of the [`Arc`] allocation.
//!
//! Callbacks always run on the endpoint's worker thread with the registry lock
//! released, so they may call back into the endpoint.
//!
//! [`invalidate_client()`]: super::SocketEndpoint::invalidate_client

use super::ConnectionId;
use std::sync::{Arc, Weak};

/// Receives bytes from, and closure notifications for, its connections.
pub trait Client: Send + Sync + 'static {
    /// `bytes` is exactly what one read returned.
    fn did_receive(&self, id: ConnectionId, bytes: Vec<u8>);

    /// The peer closed the connection, or reading from it failed. Called exactly once
    /// per connection, after the entry has already been erased.
    fn did_close(&self, id: ConnectionId);
}

/// Decides whether newly accepted connections are kept.
pub trait Listener: Send + Sync + 'static {
    /// `new_id` is already registered (under the listener's client) when this runs.
    /// Return `false` to close it.
    fn did_accept(
        &self,
        new_id: ConnectionId,
        listener_id: ConnectionId,
        domain: ConnectionDomain,
    ) -> bool;
}

/// Address family of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[non_exhaustive]
pub enum ConnectionDomain {
    /// TCP over IPv4 or IPv6.
    Network,
}

pub type WeakClient = Weak<dyn Client>;
pub type WeakListener = Weak<dyn Listener>;

#[must_use]
pub fn downgrade_client<C: Client>(client: &Arc<C>) -> WeakClient {
    let weak: Weak<C> = Arc::downgrade(client);
    weak
}

#[must_use]
pub fn downgrade_listener<L: Listener>(listener: &Arc<L>) -> WeakListener {
    let weak: Weak<L> = Arc::downgrade(listener);
    weak
}

/// Compares allocation addresses, ignoring vtable pointers.
#[must_use]
pub fn is_same_allocation<T: ?Sized, U: ?Sized>(weak: &Weak<T>, arc: &Arc<U>) -> bool {
    std::ptr::addr_eq(Weak::as_ptr(weak), Arc::as_ptr(arc))
}
