// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll rearm wakeup

//! Token mapping and poll set bookkeeping for the endpoint worker.

use super::{ConnectionId, PollDescriptor};
use mio::{Registry, Token, unix::SourceFd};
use std::collections::HashMap;

/// Which kind of source a ready [`Token`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKindReady {
    /// Receive side of the wakeup channel. Always `Token(0)`.
    Wakeup,
    /// An entry in either table; the token is the id.
    Connection(ConnectionId),
    /// `usize::MAX`, which [`mio`] reserves.
    Unknown,
}

impl SourceKindReady {
    /// # Panics
    ///
    /// Panics for [`SourceKindReady::Unknown`], which has no token.
    #[must_use]
    pub const fn to_token(self) -> Token {
        match self {
            Self::Wakeup => Token(0),
            Self::Connection(id) => id.to_token(),
            Self::Unknown => panic!("Unknown source has no token"),
        }
    }

    #[must_use]
    pub const fn from_token(token: Token) -> Self {
        if token.0 == 0 {
            return Self::Wakeup;
        }
        match ConnectionId::from_token(token) {
            Some(id) => Self::Connection(id),
            None => Self::Unknown,
        }
    }
}

/// What the worker last told the poller about one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredSource {
    pub pollable: PollDescriptor,
    /// Forces a reregister on the next rebuild, even when the interest is unchanged.
    /// Reregistering makes the edge-triggered poller re-check readiness, so a flush
    /// that stopped early gets another writable event.
    pub needs_rearm: bool,
}

/// The worker's view of what is registered with its [`mio::Poll`].
///
/// Closing an fd removes it from the kernel's interest list, and every entry is closed
/// when it leaves the tables, so ids that disappear are simply forgotten (never
/// deregistered, which could hit a reused fd).
#[derive(Debug, Default)]
pub struct SourceRegistry {
    pub registered: HashMap<ConnectionId, RegisteredSource>,
}

impl SourceRegistry {
    /// Brings the poller in line with `pollables`. Must run under the registry lock so
    /// no entry is closed (and its fd reused) halfway through.
    pub fn rebuild(
        &mut self,
        registry: &Registry,
        pollables: impl Iterator<Item = (ConnectionId, PollDescriptor)>,
    ) {
        let mut next = HashMap::with_capacity(self.registered.len());

        for (id, pollable) in pollables {
            let result = match self.registered.remove(&id) {
                None => registry.register(
                    &mut SourceFd(&pollable.fd),
                    id.to_token(),
                    pollable.interest,
                ),
                Some(previous) if previous.needs_rearm || previous.pollable != pollable => {
                    registry.reregister(
                        &mut SourceFd(&pollable.fd),
                        id.to_token(),
                        pollable.interest,
                    )
                }
                Some(_) => Ok(()),
            };

            match result {
                Ok(()) => {
                    next.insert(
                        id,
                        RegisteredSource {
                            pollable,
                            needs_rearm: false,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        message = "socket endpoint: could not register source",
                        id = %id,
                        error = ?e
                    );
                }
            }
        }

        self.registered = next;
    }

    pub fn rearm(&mut self, id: ConnectionId) {
        if let Some(source) = self.registered.get_mut(&id) {
            source.needs_rearm = true;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize { self.registered.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.registered.is_empty() }
}
