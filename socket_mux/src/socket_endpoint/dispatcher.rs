// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words wakeup

//! Event dispatching for the endpoint worker.

use super::{DEBUG_SOCKET_MUX_SHOW_IO, EndpointWorker, SocketBackend, SourceKindReady,
            drain_wakeup_receiver,
            handler_accept::accept_if_enabled,
            handler_recv::recv_if_enabled,
            handler_send::send_if_enabled};
use mio::{Events, Token, event::Event};

/// A ready event, copied out of [`Events`] so dispatch can borrow the worker mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadySource {
    pub token: Token,
    /// Readable, read closed, or errored. All of these are handled by a read.
    pub is_readable: bool,
    pub is_writable: bool,
}

impl From<&Event> for ReadySource {
    fn from(event: &Event) -> Self {
        Self {
            token: event.token(),
            is_readable: event.is_readable() || event.is_read_closed() || event.is_error(),
            is_writable: event.is_writable(),
        }
    }
}

#[must_use]
pub fn collect_ready_sources(events: &Events) -> Vec<ReadySource> {
    events.iter().map(ReadySource::from).collect()
}

/// Routes one ready source to its handler.
///
/// - Wakeup channel: drain it. The next rebuild picks up whatever changed. Other events
///   from the same batch are still dispatched, since the edge-triggered poller would not
///   report them again.
/// - Listening entry: accept.
/// - Active entry: read first, then flush if it is still there.
pub fn dispatch<B: SocketBackend>(worker: &mut EndpointWorker<B>, ready: ReadySource) {
    match SourceKindReady::from_token(ready.token) {
        SourceKindReady::Wakeup => {
            if let Some(receiver) = &worker.wakeup_receiver {
                drain_wakeup_receiver(worker.shared.backend.as_ref(), receiver);
            }
        }
        SourceKindReady::Connection(id) => {
            let is_listening = worker.shared.registry.lock().is_listening(id);
            if is_listening {
                accept_if_enabled(worker, id);
            } else {
                if ready.is_readable {
                    recv_if_enabled(worker, id);
                }
                if ready.is_writable {
                    send_if_enabled(worker, id);
                }
            }
        }
        SourceKindReady::Unknown => handle_unknown(ready.token),
    }
}

pub fn handle_unknown(token: Token) {
    DEBUG_SOCKET_MUX_SHOW_IO.then(|| {
        tracing::warn!(message = "socket endpoint: unknown token", token = ?token);
    });
}
