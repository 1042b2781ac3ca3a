// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{NativeSocket, NativeSocketBackend, SocketBackend};
use std::{collections::{BTreeSet, VecDeque},
          io,
          os::fd::{AsRawFd, RawFd},
          sync::{Mutex, PoisonError,
                 atomic::{AtomicBool, AtomicU64, Ordering}}};

/// A [`NativeSocket`] tagged with a serial number, so a test can tell which handles the
/// endpoint closed.
#[derive(Debug)]
pub struct TrackedSocket {
    pub serial: u64,
    pub inner: NativeSocket,
}

impl AsRawFd for TrackedSocket {
    fn as_raw_fd(&self) -> RawFd { self.inner.as_raw_fd() }
}

/// Decorates [`NativeSocketBackend`] and records every handle it opens and closes.
///
/// It can also misbehave on purpose:
/// - [`with_max_bytes_per_write()`]: TCP writes take at most that many bytes, and every
///   other TCP write fails with [`io::ErrorKind::WouldBlock`], forcing partial write
///   retries. The wakeup channel is never throttled.
/// - [`with_failing_create_pair()`]: [`SocketBackend::create_pair()`] fails, forcing
///   the endpoint into degraded mode.
/// - [`with_accept_errors()`]: the next accepts fail with the given error kinds before
///   the real accept runs, leaving the peer queued.
///
/// [`with_accept_errors()`]: Self::with_accept_errors
/// [`with_failing_create_pair()`]: Self::with_failing_create_pair
/// [`with_max_bytes_per_write()`]: Self::with_max_bytes_per_write
#[derive(Debug, Default)]
pub struct TrackingSocketBackend {
    inner: NativeSocketBackend,
    next_serial: AtomicU64,
    open_serials: Mutex<BTreeSet<u64>>,
    closed_serials: Mutex<BTreeSet<u64>>,
    max_bytes_per_write: Option<usize>,
    block_next_write: AtomicBool,
    fail_create_pair: bool,
    accept_errors: Mutex<VecDeque<io::ErrorKind>>,
}

impl TrackingSocketBackend {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with_max_bytes_per_write(mut self, max_bytes_per_write: usize) -> Self {
        self.max_bytes_per_write = Some(max_bytes_per_write.max(1));
        self
    }

    #[must_use]
    pub fn with_failing_create_pair(mut self) -> Self {
        self.fail_create_pair = true;
        self
    }

    #[must_use]
    pub fn with_accept_errors(self, kinds: impl IntoIterator<Item = io::ErrorKind>) -> Self {
        self.accept_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(kinds);
        self
    }

    /// Serials of handles that were opened and not closed yet.
    #[must_use]
    pub fn open_handles(&self) -> BTreeSet<u64> {
        self.open_serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn closed_handles(&self) -> BTreeSet<u64> {
        self.closed_serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_closed(&self, serial: u64) -> bool { self.closed_handles().contains(&serial) }

    fn track(&self, inner: NativeSocket) -> TrackedSocket {
        let serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
        self.open_serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(serial);
        TrackedSocket { serial, inner }
    }

    fn is_throttled(&self, handle: &TrackedSocket) -> bool {
        self.max_bytes_per_write.is_some() && matches!(handle.inner, NativeSocket::Stream(_))
    }
}

impl SocketBackend for TrackingSocketBackend {
    type Handle = TrackedSocket;

    fn connect(&self, address: &str, port: u16) -> io::Result<TrackedSocket> {
        self.inner.connect(address, port).map(|it| self.track(it))
    }

    fn listen(&self, address: &str, port: u16) -> io::Result<TrackedSocket> {
        self.inner.listen(address, port).map(|it| self.track(it))
    }

    fn accept(&self, listener: &TrackedSocket) -> io::Result<TrackedSocket> {
        let injected = self
            .accept_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(kind) = injected {
            return Err(io::Error::from(kind));
        }
        self.inner.accept(&listener.inner).map(|it| self.track(it))
    }

    fn read(&self, handle: &TrackedSocket, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(&handle.inner, buf)
    }

    fn write(&self, handle: &TrackedSocket, buf: &[u8]) -> io::Result<usize> {
        if !self.is_throttled(handle) {
            return self.inner.write(&handle.inner, buf);
        }

        // Alternate between a short write and a spurious WouldBlock.
        if self.block_next_write.fetch_xor(true, Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let limit = self.max_bytes_per_write.unwrap_or(buf.len()).min(buf.len());
        self.inner.write(&handle.inner, &buf[..limit])
    }

    fn close(&self, handle: TrackedSocket) {
        let serial = handle.serial;
        self.inner.close(handle.inner);
        self.open_serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&serial);
        self.closed_serials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(serial);
    }

    fn setup(&self, handle: &TrackedSocket) -> io::Result<()> { self.inner.setup(&handle.inner) }

    fn create_pair(&self) -> io::Result<(TrackedSocket, TrackedSocket)> {
        if self.fail_create_pair {
            return Err(io::Error::other("socket pair creation disabled"));
        }
        let (sender, receiver) = self.inner.create_pair()?;
        Ok((self.track(sender), self.track(receiver)))
    }

    fn get_port(&self, handle: &TrackedSocket) -> Option<u16> { self.inner.get_port(&handle.inner) }
}
