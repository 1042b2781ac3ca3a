// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{Client, ConnectionDomain, ConnectionId, Listener};
use std::sync::{Arc,
                atomic::{AtomicBool, Ordering},
                mpsc::{Receiver, Sender, channel}};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Received(ConnectionId, Vec<u8>),
    Closed(ConnectionId),
}

/// A [`Client`] that forwards every callback into a channel, so a test thread can wait
/// for the worker thread.
#[derive(Debug)]
pub struct RecordingClient {
    sender: Sender<ClientEvent>,
}

impl RecordingClient {
    #[must_use]
    pub fn new() -> (Arc<Self>, Receiver<ClientEvent>) {
        let (sender, receiver) = channel();
        (Arc::new(Self { sender }), receiver)
    }
}

impl Client for RecordingClient {
    fn did_receive(&self, id: ConnectionId, bytes: Vec<u8>) {
        let _unused = self.sender.send(ClientEvent::Received(id, bytes));
    }

    fn did_close(&self, id: ConnectionId) {
        let _unused = self.sender.send(ClientEvent::Closed(id));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptEvent {
    pub new_id: ConnectionId,
    pub listener_id: ConnectionId,
    pub domain: ConnectionDomain,
}

/// A [`Listener`] that forwards every [`Listener::did_accept()`] into a channel and
/// answers with [`should_accept`].
///
/// [`should_accept`]: Self::should_accept
#[derive(Debug)]
pub struct RecordingListener {
    sender: Sender<AcceptEvent>,
    pub should_accept: AtomicBool,
}

impl RecordingListener {
    /// Accepts every peer.
    #[must_use]
    pub fn new() -> (Arc<Self>, Receiver<AcceptEvent>) { Self::with_verdict(true) }

    /// Rejects every peer.
    #[must_use]
    pub fn new_rejecting() -> (Arc<Self>, Receiver<AcceptEvent>) {
        Self::with_verdict(false)
    }

    fn with_verdict(should_accept: bool) -> (Arc<Self>, Receiver<AcceptEvent>) {
        let (sender, receiver) = channel();
        let it = Self {
            sender,
            should_accept: AtomicBool::new(should_accept),
        };
        (Arc::new(it), receiver)
    }
}

impl Listener for RecordingListener {
    fn did_accept(
        &self,
        new_id: ConnectionId,
        listener_id: ConnectionId,
        domain: ConnectionDomain,
    ) -> bool {
        let _unused = self.sender.send(AcceptEvent {
            new_id,
            listener_id,
            domain,
        });
        self.should_accept.load(Ordering::SeqCst)
    }
}
