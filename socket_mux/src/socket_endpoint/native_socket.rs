// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words reuseaddr nodelay rustix

//! [`SocketBackend`] over [`std::net`] and [`UnixStream`].

use super::{DEBUG_SOCKET_MUX_SHOW_IO, SocketBackend};
use rustix::{io::{FdFlags, fcntl_getfd, fcntl_setfd},
             net::{AddressFamily, SocketType, sockopt}};
use std::{io,
          net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
          os::{fd::{AsFd, AsRawFd, BorrowedFd, RawFd},
               unix::net::UnixStream},
          time::Duration};

/// Upper bound for one connect attempt (per resolved address).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Same backlog as [`TcpListener::bind()`].
pub const LISTEN_BACKLOG: i32 = 128;

/// Every kind of socket the endpoint deals with.
#[derive(Debug)]
pub enum NativeSocket {
    Stream(TcpStream),
    Listener(TcpListener),
    /// One half of the wakeup channel.
    Local(UnixStream),
}

impl AsRawFd for NativeSocket {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Self::Stream(it) => it.as_raw_fd(),
            Self::Listener(it) => it.as_raw_fd(),
            Self::Local(it) => it.as_raw_fd(),
        }
    }
}

impl AsFd for NativeSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Stream(it) => it.as_fd(),
            Self::Listener(it) => it.as_fd(),
            Self::Local(it) => it.as_fd(),
        }
    }
}

fn read_from(mut source: impl io::Read, buf: &mut [u8]) -> io::Result<usize> {
    source.read(buf)
}

fn write_to(mut sink: impl io::Write, buf: &[u8]) -> io::Result<usize> { sink.write(buf) }

fn not_a_stream() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "listening socket has no byte stream")
}

fn no_addresses(address: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{address} did not resolve to any socket address"),
    )
}

/// Tries every resolved address in order, returning the first success or the last
/// error.
fn first_ok<T>(
    address: &str,
    port: u16,
    mut attempt: impl FnMut(SocketAddr) -> io::Result<T>,
) -> io::Result<T> {
    let mut last_error = None;
    for addr in (address, port).to_socket_addrs()? {
        match attempt(addr) {
            Ok(it) => return Ok(it),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| no_addresses(address)))
}

/// `socket`, `SO_REUSEADDR`, `bind`, `listen`. The reuse option only has an effect when
/// set before `bind`.
fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let family = if addr.is_ipv4() {
        AddressFamily::INET
    } else {
        AddressFamily::INET6
    };
    let fd = rustix::net::socket(family, SocketType::STREAM, None)?;
    fcntl_setfd(&fd, fcntl_getfd(&fd)? | FdFlags::CLOEXEC)?;
    sockopt::set_socket_reuseaddr(&fd, true)?;
    rustix::net::bind(&fd, &addr)?;
    rustix::net::listen(&fd, LISTEN_BACKLOG)?;
    Ok(TcpListener::from(fd))
}

/// Production [`SocketBackend`].
///
/// - [`connect()`] resolves the address and does a blocking connect on the calling
///   thread, bounded by [`CONNECT_TIMEOUT`] per resolved address. The stream is made
///   non-blocking afterwards by [`setup()`].
/// - [`listen()`] enables `SO_REUSEADDR` before binding.
/// - Streams get `TCP_NODELAY` since the endpoint already batches writes in its
///   outbound queues.
///
/// [`connect()`]: SocketBackend::connect
/// [`listen()`]: SocketBackend::listen
/// [`setup()`]: SocketBackend::setup
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeSocketBackend;

impl SocketBackend for NativeSocketBackend {
    type Handle = NativeSocket;

    fn connect(&self, address: &str, port: u16) -> io::Result<NativeSocket> {
        let stream = first_ok(address, port, |addr| {
            TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        })?;
        stream.set_nodelay(true)?;
        Ok(NativeSocket::Stream(stream))
    }

    fn listen(&self, address: &str, port: u16) -> io::Result<NativeSocket> {
        first_ok(address, port, bind_listener).map(NativeSocket::Listener)
    }

    fn accept(&self, listener: &NativeSocket) -> io::Result<NativeSocket> {
        let NativeSocket::Listener(listener) = listener else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "accept on a socket that is not listening",
            ));
        };
        let (stream, peer_addr) = listener.accept()?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        DEBUG_SOCKET_MUX_SHOW_IO.then(|| {
            tracing::trace!(message = "accepted peer", peer_addr = %peer_addr);
        });
        Ok(NativeSocket::Stream(stream))
    }

    fn read(&self, handle: &NativeSocket, buf: &mut [u8]) -> io::Result<usize> {
        match handle {
            NativeSocket::Stream(it) => read_from(it, buf),
            NativeSocket::Local(it) => read_from(it, buf),
            NativeSocket::Listener(_) => Err(not_a_stream()),
        }
    }

    fn write(&self, handle: &NativeSocket, buf: &[u8]) -> io::Result<usize> {
        match handle {
            NativeSocket::Stream(it) => write_to(it, buf),
            NativeSocket::Local(it) => write_to(it, buf),
            NativeSocket::Listener(_) => Err(not_a_stream()),
        }
    }

    fn close(&self, handle: NativeSocket) {
        // Shutdown first so the peer sees EOF even if the fd were duplicated elsewhere.
        match &handle {
            NativeSocket::Stream(it) => {
                let _unused = it.shutdown(Shutdown::Both);
            }
            NativeSocket::Local(it) => {
                let _unused = it.shutdown(Shutdown::Both);
            }
            NativeSocket::Listener(_) => {}
        }
        drop(handle);
    }

    /// Non-blocking mode. Address reuse is already in place for listeners, see
    /// [`listen()`](SocketBackend::listen).
    fn setup(&self, handle: &NativeSocket) -> io::Result<()> {
        match handle {
            NativeSocket::Stream(it) => it.set_nonblocking(true),
            NativeSocket::Listener(it) => it.set_nonblocking(true),
            NativeSocket::Local(it) => it.set_nonblocking(true),
        }
    }

    fn create_pair(&self) -> io::Result<(NativeSocket, NativeSocket)> {
        let (sender, receiver) = UnixStream::pair()?;
        Ok((NativeSocket::Local(sender), NativeSocket::Local(receiver)))
    }

    fn get_port(&self, handle: &NativeSocket) -> Option<u16> {
        match handle {
            NativeSocket::Stream(it) => it.local_addr().ok().map(|addr| addr.port()),
            NativeSocket::Listener(it) => it.local_addr().ok().map(|addr| addr.port()),
            NativeSocket::Local(_) => None,
        }
    }
}
