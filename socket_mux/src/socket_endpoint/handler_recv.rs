// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR rearm

//! Reading from active connections.

use super::{Client, ConnectionId, DEBUG_SOCKET_MUX_SHOW_IO, EndpointWorker,
            SocketBackend};
use std::{io::ErrorKind, sync::Arc};

enum RecvOutcome {
    Data(Arc<dyn Client>, Vec<u8>),
    Closed(Arc<dyn Client>),
}

/// Reads chunks of [`read_chunk_size`] until the socket would block, delivering each
/// chunk with one [`Client::did_receive()`] call. After [`max_reads_per_event`] chunks
/// the source is re-armed instead, and the rest is read on a later poll cycle.
///
/// An orderly close (`0` bytes) or a read error closes the socket, erases the entry,
/// then calls [`Client::did_close()`] exactly once. If the client has been dropped
/// without being invalidated, the entry is closed and erased silently.
///
/// Callbacks run with the registry lock released.
///
/// [`max_reads_per_event`]: super::EndpointConfig::max_reads_per_event
/// [`read_chunk_size`]: super::EndpointConfig::read_chunk_size
pub fn recv_if_enabled<B: SocketBackend>(worker: &mut EndpointWorker<B>, id: ConnectionId) {
    let shared = Arc::clone(&worker.shared);
    let max_reads = shared.config.max_reads_per_event;
    let mut reads = 0;

    loop {
        if shared.is_abort_requested() {
            return;
        }

        if reads == max_reads {
            // Edge-triggered: without a re-arm the leftover bytes are never reported.
            worker.sources.rearm(id);
            return;
        }

        let mut tables = shared.registry.lock();

        let Some(connection) = tables.get_active(id) else {
            return;
        };

        let Some(client) = connection.client.upgrade() else {
            if let Some(connection) = tables.remove_active(id) {
                shared.close_connection(connection);
            }
            tracing::debug!(message = "socket endpoint: client dropped, closed", id = %id);
            return;
        };

        let outcome = match shared.backend.read(&connection.socket, &mut worker.read_buffer)
        {
            Ok(0) => {
                DEBUG_SOCKET_MUX_SHOW_IO.then(|| {
                    tracing::debug!(message = "socket endpoint: EOF", id = %id);
                });
                RecvOutcome::Closed(client)
            }
            Ok(n) => {
                reads += 1;
                RecvOutcome::Data(client, worker.read_buffer[..n].to_vec())
            }
            // EINTR - retry.
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            // Nothing more buffered right now.
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => return,
            Err(e) => {
                tracing::debug!(message = "socket endpoint: read error", id = %id, error = ?e);
                RecvOutcome::Closed(client)
            }
        };

        if let RecvOutcome::Closed(_) = &outcome
            && let Some(connection) = tables.remove_active(id)
        {
            shared.close_connection(connection);
        }

        // Enter the callback barrier before the registry lock is released.
        let _in_flight = shared.enter_callback();
        drop(tables);

        match outcome {
            RecvOutcome::Data(client, bytes) => {
                DEBUG_SOCKET_MUX_SHOW_IO.then(|| {
                    tracing::trace!(
                        message = "socket endpoint: received",
                        id = %id,
                        bytes = bytes.len()
                    );
                });
                client.did_receive(id, bytes);
            }
            RecvOutcome::Closed(client) => {
                client.did_close(id);
                return;
            }
        }
    }
}
