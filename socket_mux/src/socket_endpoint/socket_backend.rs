// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words reuseaddr

//! The socket primitives the endpoint is built on. See [`SocketBackend`].

use std::{io, os::fd::AsRawFd};

/// Platform socket operations, injected into [`SocketEndpoint`] so tests can observe or
/// perturb them (see [`TrackingSocketBackend`]).
///
/// [`io::ErrorKind::WouldBlock`] means "no progress right now" and is never treated as a
/// failure by the endpoint. Readiness polling is not part of this trait: handles expose
/// their raw fd via [`AsRawFd`] and the worker registers that with [`mio`].
///
/// | Operation          | Contract                                                    |
/// | :----------------- | :---------------------------------------------------------- |
/// | [`connect()`]      | Connected stream, ready for [`setup()`]                     |
/// | [`listen()`]       | Bound and listening socket                                  |
/// | [`accept()`]       | One pending peer, already non-blocking                      |
/// | [`read()`]         | `Ok(0)` means orderly close                                 |
/// | [`write()`]        | May write fewer bytes than asked                            |
/// | [`close()`]        | Consumes the handle                                         |
/// | [`setup()`]        | Non-blocking plus address reuse                             |
/// | [`create_pair()`]  | Connected local pair, used for the wakeup channel           |
/// | [`get_port()`]     | Bound local port                                            |
///
/// [`SocketEndpoint`]: super::SocketEndpoint
/// [`TrackingSocketBackend`]: crate::TrackingSocketBackend
/// [`accept()`]: Self::accept
/// [`close()`]: Self::close
/// [`connect()`]: Self::connect
/// [`create_pair()`]: Self::create_pair
/// [`get_port()`]: Self::get_port
/// [`listen()`]: Self::listen
/// [`read()`]: Self::read
/// [`setup()`]: Self::setup
/// [`write()`]: Self::write
pub trait SocketBackend: Send + Sync + 'static {
    type Handle: AsRawFd + Send + Sync + 'static;

    /// # Errors
    ///
    /// Resolution, refusal, or any other connect failure.
    fn connect(&self, address: &str, port: u16) -> io::Result<Self::Handle>;

    /// # Errors
    ///
    /// Resolution or bind failure.
    fn listen(&self, address: &str, port: u16) -> io::Result<Self::Handle>;

    /// # Errors
    ///
    /// [`io::ErrorKind::WouldBlock`] when nothing is pending.
    fn accept(&self, listener: &Self::Handle) -> io::Result<Self::Handle>;

    /// # Errors
    ///
    /// [`io::ErrorKind::WouldBlock`] when nothing is buffered.
    fn read(&self, handle: &Self::Handle, buf: &mut [u8]) -> io::Result<usize>;

    /// # Errors
    ///
    /// [`io::ErrorKind::WouldBlock`] when the send buffer is full.
    fn write(&self, handle: &Self::Handle, buf: &[u8]) -> io::Result<usize>;

    fn close(&self, handle: Self::Handle);

    /// # Errors
    ///
    /// Any failure to configure the socket options.
    fn setup(&self, handle: &Self::Handle) -> io::Result<()>;

    /// Returns `(sender, receiver)`.
    ///
    /// # Errors
    ///
    /// Usually fd exhaustion.
    fn create_pair(&self) -> io::Result<(Self::Handle, Self::Handle)>;

    fn get_port(&self, handle: &Self::Handle) -> Option<u16>;
}
