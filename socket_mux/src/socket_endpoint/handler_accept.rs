// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR rearm

//! Accepting peers on listening entries.

use super::{ConnectionDomain, ConnectionId, EndpointWorker, SocketBackend};
use std::{io::ErrorKind, sync::Arc};

/// Accepts pending peers on the listener `id` until it would block, or until
/// [`max_reads_per_event`] peers were accepted (then the source is re-armed).
///
/// Each peer is set up and registered as an active connection under the listener's
/// client, then offered to [`Listener::did_accept()`] with the registry lock released.
/// A rejection (or a listener that no longer exists) closes and erases the new entry.
///
/// A peer that aborted while queued is skipped. Any other accept failure is logged and
/// the source is re-armed, so the listener stays open and peers still queued are
/// retried on the next poll cycle.
///
/// [`Listener::did_accept()`]: super::Listener::did_accept
/// [`max_reads_per_event`]: super::EndpointConfig::max_reads_per_event
pub fn accept_if_enabled<B: SocketBackend>(worker: &mut EndpointWorker<B>, id: ConnectionId) {
    let shared = Arc::clone(&worker.shared);
    let max_accepts = shared.config.max_reads_per_event;
    let mut accepts = 0;

    loop {
        if shared.is_abort_requested() {
            return;
        }

        if accepts == max_accepts {
            worker.sources.rearm(id);
            return;
        }

        let mut tables = shared.registry.lock();

        let Some(listening) = tables.get_listening(id) else {
            return;
        };

        let socket = match shared.backend.accept(&listening.socket) {
            Ok(socket) => socket,
            // EINTR - retry.
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            // No more pending peers.
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => return,
            // The peer went away while queued; the next one may be fine.
            Err(ref e) if e.kind() == ErrorKind::ConnectionAborted => continue,
            Err(e) => {
                tracing::debug!(
                    message = "socket endpoint: accept failed",
                    listener_id = %id,
                    error = ?e
                );
                drop(tables);
                worker.sources.rearm(id);
                return;
            }
        };

        accepts += 1;

        let client = listening.client.clone();
        let listener = listening.listener.as_ref().and_then(std::sync::Weak::upgrade);

        if let Err(e) = shared.backend.setup(&socket) {
            tracing::debug!(
                message = "socket endpoint: setup of accepted socket failed",
                listener_id = %id,
                error = ?e
            );
            shared.backend.close(socket);
            continue;
        }

        let new_id = tables.insert_active(socket, client);

        // Enter the callback barrier before the registry lock is released.
        let in_flight = shared.enter_callback();
        drop(tables);

        let is_accepted = listener
            .is_some_and(|it| it.did_accept(new_id, id, ConnectionDomain::Network));
        drop(in_flight);

        if !is_accepted {
            if let Some(connection) = shared.registry.lock().remove_active(new_id) {
                shared.close_connection(connection);
            }
            tracing::debug!(
                message = "socket endpoint: accepted peer rejected",
                listener_id = %id,
                new_id = %new_id
            );
        }
    }
}
