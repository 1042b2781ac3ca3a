// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{ConnectionId, DEBUG_SOCKET_MUX_SHOW_IO, SocketBackend, WeakClient,
            WeakListener};
use mio::Interest;
use std::{io::{self, ErrorKind},
          os::fd::{AsRawFd, RawFd}};

/// What the worker's poller should watch for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollDescriptor {
    pub fd: RawFd,
    pub interest: Interest,
}

/// Per-connection state. Owned by the [`ConnectionTables`]; nothing outside the registry
/// holds one across a lock release.
///
/// [`ConnectionTables`]: super::ConnectionTables
#[allow(missing_debug_implementations)]
pub struct Connection<H> {
    pub id: ConnectionId,
    pub socket: H,
    /// Bytes accepted by [`send()`] that the socket has not taken yet, in call order.
    ///
    /// [`send()`]: super::SocketEndpoint::send
    pub outbound: Vec<u8>,
    /// Write readiness is only polled while this is set.
    pub waiting_writable: bool,
    pub client: WeakClient,
    /// Only present for entries in the listening table.
    pub listener: Option<WeakListener>,
}

/// Result of [`Connection::flush_outbound()`].
#[derive(Debug)]
pub enum FlushOutcome {
    /// The outbound queue is empty.
    Drained,
    /// The socket stopped taking bytes; the rest stays queued.
    Pending,
    /// The socket failed. The rest stays queued and write readiness is no longer polled;
    /// the read side reports the closure.
    Failed(io::Error),
}

impl<H: AsRawFd> Connection<H> {
    #[must_use]
    pub fn new_active(id: ConnectionId, socket: H, client: WeakClient) -> Self {
        Self {
            id,
            socket,
            outbound: Vec::new(),
            waiting_writable: false,
            client,
            listener: None,
        }
    }

    #[must_use]
    pub fn new_listening(
        id: ConnectionId,
        socket: H,
        listener: WeakListener,
        client: WeakClient,
    ) -> Self {
        Self {
            listener: Some(listener),
            ..Self::new_active(id, socket, client)
        }
    }

    #[must_use]
    pub fn interest(&self) -> Interest {
        if self.waiting_writable {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        }
    }

    #[must_use]
    pub fn pollable(&self) -> PollDescriptor {
        PollDescriptor {
            fd: self.socket.as_raw_fd(),
            interest: self.interest(),
        }
    }

    /// Writes from the front of [`outbound`] until it is empty or the socket stops
    /// taking bytes, then drops the written prefix and updates [`waiting_writable`].
    ///
    /// [`outbound`]: Self::outbound
    /// [`waiting_writable`]: Self::waiting_writable
    pub fn flush_outbound<B>(&mut self, backend: &B) -> FlushOutcome
    where
        B: SocketBackend<Handle = H>,
    {
        let mut written = 0;

        let outcome = loop {
            if written == self.outbound.len() {
                break FlushOutcome::Drained;
            }
            match backend.write(&self.socket, &self.outbound[written..]) {
                Ok(0) => break FlushOutcome::Pending,
                Ok(n) => written += n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    break FlushOutcome::Pending;
                }
                Err(e) => break FlushOutcome::Failed(e),
            }
        };

        self.outbound.drain(..written);
        self.waiting_writable = matches!(outcome, FlushOutcome::Pending);

        DEBUG_SOCKET_MUX_SHOW_IO.then(|| {
            tracing::trace!(
                message = "flushed outbound queue",
                id = %self.id,
                written,
                remaining = self.outbound.len()
            );
        });

        outcome
    }
}
