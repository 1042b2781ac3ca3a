// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Listening entries: accepting peers into active connections, rejecting them, and
//! invalidating the listener.

use super::test_helpers::*;
use crate::{ConnectionDomain, DEFAULT_WAIT_TIMEOUT, EndpointConfig, NativeSocketBackend,
            RecordingClient, RecordingListener, SocketEndpoint, TrackingSocketBackend,
            collect_received_bytes, is_closed_by_peer, read_exactly_with_timeout,
            wait_until};
use pretty_assertions::assert_eq;
use std::{io::{self, Write as _},
          net::TcpStream,
          sync::atomic::Ordering,
          time::Duration};

#[test]
fn test_accept_creates_active_connection() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (listener, accepts) = RecordingListener::new();
    let (client, events) = RecordingClient::new();

    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    assert!(endpoint.is_listening(listener_id));
    assert_eq!(endpoint.listener_count(), 1);
    assert_eq!(endpoint.connection_count(), 0);

    let port = endpoint.get_port(listener_id).unwrap();
    assert_ne!(port, 0);

    let mut peer = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let accept = accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap();
    assert_eq!(accept.listener_id, listener_id);
    assert_eq!(accept.domain, ConnectionDomain::Network);
    assert_ne!(accept.new_id, listener_id);

    let new_id = accept.new_id;
    assert!(!endpoint.is_listening(new_id));
    assert_eq!(endpoint.connection_count(), 1);
    assert_eq!(endpoint.get_port(new_id), Some(port));

    peer.write_all(b"ping").unwrap();
    assert_eq!(collect_received_bytes(&events, new_id, 4), b"ping");

    endpoint.send(new_id, b"pong");
    assert_eq!(read_exactly_with_timeout(&mut peer, 4).unwrap(), b"pong");
}

#[test]
fn test_accepts_every_pending_peer() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (listener, accepts) = RecordingListener::new();
    let (client, _events) = RecordingClient::new();

    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    let port = endpoint.get_port(listener_id).unwrap();

    let peers: Vec<TcpStream> = (0..5)
        .map(|_| TcpStream::connect(("127.0.0.1", port)).unwrap())
        .collect();

    let mut new_ids: Vec<_> = (0..peers.len())
        .map(|_| accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap().new_id)
        .collect();
    new_ids.sort();
    new_ids.dedup();
    assert_eq!(new_ids.len(), peers.len());
    assert_eq!(endpoint.connection_count(), peers.len());
}

#[test]
fn test_pending_peers_accepted_across_events_when_capped() {
    let config = EndpointConfig::default().with_max_reads_per_event(1);
    let endpoint = SocketEndpoint::try_new(NativeSocketBackend, config).unwrap();
    let (listener, accepts) = RecordingListener::new();
    let (client, _events) = RecordingClient::new();

    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    let port = endpoint.get_port(listener_id).unwrap();

    let _peers: Vec<TcpStream> = (0..4)
        .map(|_| TcpStream::connect(("127.0.0.1", port)).unwrap())
        .collect();

    for _ in 0..4 {
        accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap();
    }
    assert_eq!(endpoint.connection_count(), 4);
}

#[test]
fn test_accept_errors_do_not_stall_listener() {
    let backend = TrackingSocketBackend::new().with_accept_errors([
        io::ErrorKind::ConnectionAborted,
        io::ErrorKind::OutOfMemory,
    ]);
    let endpoint = create_endpoint(backend);
    let (listener, accepts) = RecordingListener::new();
    let (client, events) = RecordingClient::new();

    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    let port = endpoint.get_port(listener_id).unwrap();

    // Only one readiness edge for this peer; the failed accept must not swallow it.
    let mut peer = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let accept = accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap();
    assert_eq!(accept.listener_id, listener_id);
    assert!(endpoint.is_listening(listener_id));
    assert_eq!(endpoint.connection_count(), 1);

    peer.write_all(b"still here").unwrap();
    assert_eq!(collect_received_bytes(&events, accept.new_id, 10), b"still here");
}

#[test]
fn test_rejected_peer_is_closed() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (listener, accepts) = RecordingListener::new_rejecting();
    let (client, events) = RecordingClient::new();

    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    let port = endpoint.get_port(listener_id).unwrap();

    let mut peer = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let accept = accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap();

    assert!(is_closed_by_peer(&mut peer).unwrap());
    assert!(!endpoint.is_listening(accept.new_id));
    assert_eq!(endpoint.connection_count(), 0);
    assert!(endpoint.is_listening(listener_id));

    // Rejection is silent for the client.
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());

    // The verdict is asked per peer.
    listener.should_accept.store(true, Ordering::SeqCst);
    let _peer = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let accept = accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap();
    assert!(wait_until(DEFAULT_WAIT_TIMEOUT, || endpoint.connection_count() == 1));
    assert!(endpoint.get_port(accept.new_id).is_some());
}

#[test]
fn test_listen_on_taken_port_fails() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (_peer_listener, port) = create_peer_listener();
    let (listener, _accepts) = RecordingListener::new();
    let (client, _events) = RecordingClient::new();

    assert_eq!(endpoint.listen_inet("127.0.0.1", port, &listener, &client), None);
    assert_eq!(endpoint.listener_count(), 0);
}

#[test]
fn test_invalidate_listener_stops_accepting() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (listener, accepts) = RecordingListener::new();
    let (other_listener, _other_accepts) = RecordingListener::new();
    let (client, _events) = RecordingClient::new();

    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    let other_id = endpoint
        .listen_inet("127.0.0.1", 0, &other_listener, &client)
        .unwrap();
    let port = endpoint.get_port(listener_id).unwrap();

    // Already accepted connections are not touched.
    let _peer = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let accept = accepts.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap();

    endpoint.invalidate_listener(&listener);

    assert!(!endpoint.is_listening(listener_id));
    assert!(endpoint.is_listening(other_id));
    assert_eq!(endpoint.listener_count(), 1);
    assert_eq!(endpoint.get_port(listener_id), None);
    assert!(endpoint.get_port(accept.new_id).is_some());
    assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
    assert!(accepts.recv_timeout(Duration::from_millis(100)).is_err());
}
