// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Construction, failure to connect, degraded mode, and teardown.

use super::test_helpers::*;
use crate::{EndpointConfig, LivenessState, RecordingClient, RecordingListener,
            SocketEndpoint, TrackingSocketBackend, collect_received_bytes,
            is_closed_by_peer, read_exactly_with_timeout};
use pretty_assertions::assert_eq;
use std::{io::Write as _, time::Duration};

#[test]
fn test_connect_failure_creates_nothing() {
    let endpoint = create_tracking_endpoint();
    let backend = endpoint.backend();
    let (client, events) = RecordingClient::new();

    assert_eq!(endpoint.connect_inet("127.0.0.1", unused_port(), &client), None);

    assert_eq!(endpoint.connection_count(), 0);
    // Only the wakeup pair.
    assert_eq!(backend.open_handles().len(), 2);
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_worker_thread_is_named_and_running() {
    let config = EndpointConfig::default().with_worker_thread_name("mux-under-test");
    let endpoint = SocketEndpoint::try_new(TrackingSocketBackend::new(), config).unwrap();

    assert_eq!(endpoint.is_worker_running(), LivenessState::Running);
    assert!(!endpoint.is_degraded());
    assert_eq!(endpoint.config().worker_thread_name, "mux-under-test");
}

#[test]
fn test_teardown_closes_everything_without_callbacks() {
    let endpoint = create_tracking_endpoint();
    let backend = endpoint.backend();
    let liveness = endpoint.worker_liveness();
    let (peer_listener, port) = create_peer_listener();
    let (client, events) = RecordingClient::new();
    let (listener, _accepts) = RecordingListener::new();

    let _id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);
    let listener_id = endpoint
        .listen_inet("127.0.0.1", 0, &listener, &client)
        .unwrap();
    let listen_port = endpoint.get_port(listener_id).unwrap();

    // Wakeup pair, one stream, one listener.
    assert_eq!(backend.open_handles().len(), 4);

    drop(endpoint);

    assert_eq!(liveness.is_running(), LivenessState::Terminated);
    assert!(backend.open_handles().is_empty());
    assert_eq!(backend.closed_handles().len(), 4);
    assert!(is_closed_by_peer(&mut peer).unwrap());
    assert!(std::net::TcpStream::connect(("127.0.0.1", listen_port)).is_err());

    // The worker is joined, so nothing can still be in flight.
    assert!(events.try_recv().is_err());
}

#[test]
fn test_teardown_with_pending_outbound_bytes() {
    let endpoint =
        create_endpoint(TrackingSocketBackend::new().with_max_bytes_per_write(1));
    let backend = endpoint.backend();
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let _peer = accept_peer(&peer_listener);
    endpoint.send(id, &[b'z'; 4_096]);

    drop(endpoint);
    assert!(backend.open_handles().is_empty());
}

#[test]
fn test_degraded_mode_still_serves_connections() {
    let config = EndpointConfig::default()
        .with_degraded_poll_timeout(Duration::from_millis(10));
    let endpoint = SocketEndpoint::try_new(
        TrackingSocketBackend::new().with_failing_create_pair(),
        config,
    )
    .unwrap();
    let backend = endpoint.backend();
    let liveness = endpoint.worker_liveness();
    assert!(endpoint.is_degraded());

    let (peer_listener, port) = create_peer_listener();
    let (client, events) = RecordingClient::new();
    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    peer.write_all(b"slow path").unwrap();
    assert_eq!(collect_received_bytes(&events, id, 9), b"slow path");

    endpoint.send(id, b"fine");
    assert_eq!(read_exactly_with_timeout(&mut peer, 4).unwrap(), b"fine");

    drop(endpoint);
    assert_eq!(liveness.is_running(), LivenessState::Terminated);
    assert!(backend.open_handles().is_empty());
}
