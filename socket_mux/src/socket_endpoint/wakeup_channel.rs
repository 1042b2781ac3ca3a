// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words wakeup

//! A connected local socket pair used as a single-slot "wake up" notification. The
//! bytes carry no meaning; only their arrival does.

use super::{DEBUG_SOCKET_MUX_SHOW_IO, SocketBackend, SourceKindReady};
use crate::core::reactor_thread::RRTWaker;
use mio::{Interest, Registry, unix::SourceFd};
use std::{io::{self, ErrorKind},
          os::fd::AsRawFd as _,
          sync::Arc};

/// Size of the scratch buffer used to drain the receive side.
pub const WAKEUP_DRAIN_BUFFER_SIZE: usize = 64;

/// Send side of the wakeup channel. The receive side is owned by the worker.
#[allow(missing_debug_implementations)]
pub struct SocketPairWaker<B: SocketBackend> {
    backend: Arc<B>,
    sender: Option<B::Handle>,
}

impl<B: SocketBackend> RRTWaker for SocketPairWaker<B> {
    /// Writes one byte. A full buffer means a wakeup is already pending, which is just
    /// as good.
    fn wake_and_unblock_dedicated_thread(&self) {
        let Some(sender) = &self.sender else { return };
        match self.backend.write(sender, &[1]) {
            Ok(_) => {}
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => {
                tracing::warn!(message = "wakeup channel: write failed", error = ?e);
            }
        }
    }
}

impl<B: SocketBackend> Drop for SocketPairWaker<B> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            self.backend.close(sender);
        }
    }
}

/// Creates the pair, makes both ends non-blocking, and registers the receive side with
/// `registry` under [`SourceKindReady::Wakeup`]. Returns `(receiver, waker)`.
///
/// # Errors
///
/// Any failure along the way. Both ends are closed before returning the error.
pub fn try_create_wakeup_channel<B: SocketBackend>(
    backend: &Arc<B>,
    registry: &Registry,
) -> io::Result<(B::Handle, SocketPairWaker<B>)> {
    let (sender, receiver) = backend.create_pair()?;

    let setup_result = backend
        .setup(&sender)
        .and_then(|()| backend.setup(&receiver))
        .and_then(|()| {
            registry.register(
                &mut SourceFd(&receiver.as_raw_fd()),
                SourceKindReady::Wakeup.to_token(),
                Interest::READABLE,
            )
        });

    if let Err(e) = setup_result {
        backend.close(sender);
        backend.close(receiver);
        return Err(e);
    }

    let waker = SocketPairWaker {
        backend: Arc::clone(backend),
        sender: Some(sender),
    };
    Ok((receiver, waker))
}

/// Reads until the receive side would block. Returns how many bytes were consumed.
pub fn drain_wakeup_receiver<B: SocketBackend>(backend: &B, receiver: &B::Handle) -> usize {
    let mut scratch = [0u8; WAKEUP_DRAIN_BUFFER_SIZE];
    let mut drained = 0;
    loop {
        match backend.read(receiver, &mut scratch) {
            Ok(0) => break,
            Ok(n) => drained += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => {
                tracing::warn!(message = "wakeup channel: read failed", error = ?e);
                break;
            }
        }
    }
    DEBUG_SOCKET_MUX_SHOW_IO.then(|| {
        tracing::trace!(message = "wakeup channel: drained", bytes = drained);
    });
    drained
}
