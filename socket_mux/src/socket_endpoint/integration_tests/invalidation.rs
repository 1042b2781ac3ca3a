// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`invalidate_client()`] closes every connection of one client without calling it,
//! and leaves other clients alone.
//!
//! [`invalidate_client()`]: crate::SocketEndpoint::invalidate_client

use super::test_helpers::*;
use crate::{Client, ConnectionId, RecordingClient, collect_received_bytes,
            is_closed_by_peer};
use pretty_assertions::assert_eq;
use std::{io::Write as _,
          sync::{Arc,
                 atomic::{AtomicUsize, Ordering}},
          time::Duration};

#[test]
fn test_invalidate_client_closes_only_its_connections() {
    let endpoint = create_tracking_endpoint();
    let backend = endpoint.backend();
    let (peer_listener, port) = create_peer_listener();
    let (client_a, events_a) = RecordingClient::new();
    let (client_b, events_b) = RecordingClient::new();

    let a1 = endpoint.connect_inet("127.0.0.1", port, &client_a).unwrap();
    let mut peer_a1 = accept_peer(&peer_listener);
    let _a2 = endpoint.connect_inet("127.0.0.1", port, &client_a).unwrap();
    let mut peer_a2 = accept_peer(&peer_listener);
    let b1 = endpoint.connect_inet("127.0.0.1", port, &client_b).unwrap();
    let mut peer_b1 = accept_peer(&peer_listener);

    // Wakeup pair plus three streams.
    assert_eq!(backend.open_handles().len(), 5);

    endpoint.invalidate_client(&client_a);

    assert_eq!(endpoint.connection_count(), 1);
    assert_eq!(backend.open_handles().len(), 3);
    assert_eq!(backend.closed_handles().len(), 2);
    assert_eq!(endpoint.get_port(a1), None);
    assert!(is_closed_by_peer(&mut peer_a1).unwrap());
    assert!(is_closed_by_peer(&mut peer_a2).unwrap());

    // No did_close for an invalidated client.
    assert!(events_a.recv_timeout(Duration::from_millis(200)).is_err());

    peer_b1.write_all(b"still here").unwrap();
    assert_eq!(collect_received_bytes(&events_b, b1, 10), b"still here");
}

#[test]
fn test_invalidate_unknown_client_is_a_no_op() {
    let endpoint = create_tracking_endpoint();
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();
    let (stranger, _stranger_events) = RecordingClient::new();

    let _id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let _peer = accept_peer(&peer_listener);

    endpoint.invalidate_client(&stranger);
    assert_eq!(endpoint.connection_count(), 1);
}

/// Counts callbacks that start after it was invalidated.
#[derive(Debug, Default)]
struct LateCallbackCounter {
    is_invalidated: std::sync::atomic::AtomicBool,
    late_callbacks: AtomicUsize,
}

impl LateCallbackCounter {
    fn record(&self) {
        if self.is_invalidated.load(Ordering::SeqCst) {
            self.late_callbacks.fetch_add(1, Ordering::SeqCst);
        }
        // Widen the window in which invalidation races a running callback.
        std::thread::sleep(Duration::from_millis(1));
    }
}

impl Client for LateCallbackCounter {
    fn did_receive(&self, _id: ConnectionId, _bytes: Vec<u8>) { self.record(); }

    fn did_close(&self, _id: ConnectionId) { self.record(); }
}

#[test]
fn test_no_callback_after_invalidate_returns() {
    let endpoint = create_tracking_endpoint();
    let (peer_listener, port) = create_peer_listener();
    let client = Arc::new(LateCallbackCounter::default());

    let _id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    let flood = std::thread::spawn(move || {
        for _ in 0..200 {
            if peer.write_all(b"x").is_err() {
                break;
            }
            std::thread::sleep(Duration::from_micros(200));
        }
    });

    std::thread::sleep(Duration::from_millis(20));
    endpoint.invalidate_client(&client);
    client.is_invalidated.store(true, Ordering::SeqCst);

    flood.join().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(client.late_callbacks.load(Ordering::SeqCst), 0);
    assert_eq!(endpoint.connection_count(), 0);
}
