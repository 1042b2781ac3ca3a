// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Helpers for waiting on the endpoint's worker thread from a test thread. Every wait
//! is bounded so a broken endpoint fails a test instead of hanging it.

use super::ClientEvent;
use crate::ConnectionId;
use std::{io::{self, Read as _},
          net::TcpStream,
          sync::mpsc::Receiver,
          time::{Duration, Instant}};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Polls `predicate` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Concatenates [`ClientEvent::Received`] payloads for `id` until `expected_len` bytes
/// arrived or [`DEFAULT_WAIT_TIMEOUT`] elapsed. Other events are dropped.
#[must_use]
pub fn collect_received_bytes(
    events: &Receiver<ClientEvent>,
    id: ConnectionId,
    expected_len: usize,
) -> Vec<u8> {
    let deadline = Instant::now() + DEFAULT_WAIT_TIMEOUT;
    let mut acc = Vec::with_capacity(expected_len);
    while acc.len() < expected_len {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(ClientEvent::Received(event_id, bytes)) if event_id == id => {
                acc.extend_from_slice(&bytes);
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    acc
}

/// Waits for [`ClientEvent::Closed`] for `id`, skipping everything else.
#[must_use]
pub fn wait_for_close(events: &Receiver<ClientEvent>, id: ConnectionId) -> bool {
    let deadline = Instant::now() + DEFAULT_WAIT_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(ClientEvent::Closed(event_id)) if event_id == id => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

/// Reads exactly `len` bytes from a plain (test side) socket.
///
/// # Errors
///
/// Timeout, EOF, or any read error.
pub fn read_exactly_with_timeout(stream: &mut TcpStream, len: usize) -> io::Result<Vec<u8>> {
    stream.set_read_timeout(Some(DEFAULT_WAIT_TIMEOUT))?;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// True if the peer closed `stream` (a read returns `0`) within the default timeout.
///
/// # Errors
///
/// Timeout, or any read error other than a reset.
pub fn is_closed_by_peer(stream: &mut TcpStream) -> io::Result<bool> {
    stream.set_read_timeout(Some(DEFAULT_WAIT_TIMEOUT))?;
    let mut buf = [0u8; 64];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => return Ok(true),
            Err(e) => return Err(e),
        }
    }
}
