// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words rearm

//! Flushing outbound queues when the socket becomes writable.

use super::{ConnectionId, EndpointWorker, FlushOutcome, SocketBackend};

/// Clears the waiting-writable flag, then writes as much of the outbound queue as the
/// socket takes. If bytes remain, the flag is set again and the source is re-armed so
/// the next readiness cycle resumes the flush. Order of bytes is the order of
/// [`send()`] calls.
///
/// A write error leaves the bytes queued; the read side reports the closure.
///
/// [`send()`]: super::SocketEndpoint::send
pub fn send_if_enabled<B: SocketBackend>(worker: &mut EndpointWorker<B>, id: ConnectionId) {
    let mut tables = worker.shared.registry.lock();

    let Some(connection) = tables.get_active_mut(id) else {
        return;
    };

    connection.waiting_writable = false;
    if connection.outbound.is_empty() {
        return;
    }

    match connection.flush_outbound(worker.shared.backend.as_ref()) {
        FlushOutcome::Drained => {}
        FlushOutcome::Pending => worker.sources.rearm(id),
        FlushOutcome::Failed(e) => {
            tracing::debug!(
                message = "socket endpoint: write error",
                id = %id,
                error = ?e
            );
        }
    }
}
