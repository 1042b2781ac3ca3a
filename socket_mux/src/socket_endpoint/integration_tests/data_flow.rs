// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bytes in both directions on active connections, and how a peer close is reported.

use super::test_helpers::*;
use crate::{NativeSocket, NativeSocketBackend, RecordingClient,
            TrackingSocketBackend, collect_received_bytes, read_exactly_with_timeout,
            wait_for_close};
use pretty_assertions::assert_eq;
use rustix::net::sockopt;
use std::{io::Write as _, net::TcpStream, time::Duration};

#[test]
fn test_peer_bytes_reach_did_receive() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    peer.write_all(b"hello, endpoint").unwrap();
    assert_eq!(collect_received_bytes(&events, id, 15), b"hello, endpoint");
}

#[test]
fn test_sends_arrive_in_call_order() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    endpoint.send(id, b"AB");
    endpoint.send(id, b"CD");
    endpoint.send(id, b"");
    endpoint.send(id, b"EF");

    assert_eq!(read_exactly_with_timeout(&mut peer, 6).unwrap(), b"ABCDEF");
}

#[test]
fn test_partial_writes_are_retried_in_order() {
    // Every write takes one byte or would block, so almost everything goes through the
    // outbound queue and the worker's writable handling.
    let endpoint =
        create_endpoint(TrackingSocketBackend::new().with_max_bytes_per_write(1));
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    endpoint.send(id, b"AB");
    endpoint.send(id, b"CD");

    assert_eq!(read_exactly_with_timeout(&mut peer, 4).unwrap(), b"ABCD");
}

#[test]
fn test_payload_larger_than_socket_buffers() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    let payload: Vec<u8> = (0..=250u8).cycle().take(4 * 1_024 * 1_024).collect();
    endpoint.send(id, &payload);
    endpoint.send(id, b"tail");

    let received = read_exactly_with_timeout(&mut peer, payload.len() + 4).unwrap();
    assert_eq!(received.len(), payload.len() + 4);
    assert!(received[..payload.len()] == payload[..]);
    assert_eq!(&received[payload.len()..], b"tail");
}

#[test]
fn test_send_to_unknown_id_is_ignored() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let _peer = accept_peer(&peer_listener);
    endpoint.invalidate_client(&client);

    endpoint.send(id, b"dropped");
    assert_eq!(endpoint.connection_count(), 0);
}

#[test]
fn test_peer_close_reported_exactly_once() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);
    peer.write_all(b"bye").unwrap();
    drop(peer);

    assert_eq!(collect_received_bytes(&events, id, 3), b"bye");
    assert!(wait_for_close(&events, id));

    // Removed before did_close ran.
    assert_eq!(endpoint.connection_count(), 0);
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());

    // Sending to the closed id is a no-op.
    endpoint.send(id, b"late");
    assert_eq!(endpoint.get_port(id), None);
}

#[test]
fn test_peer_reset_reported_exactly_once() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, events) = RecordingClient::new();

    let id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let peer = accept_peer(&peer_listener);

    // Zero linger makes the close send RST, so the endpoint sees a read error instead
    // of end of stream.
    sockopt::set_socket_linger(&peer, Some(Duration::ZERO)).unwrap();
    drop(peer);

    assert!(wait_for_close(&events, id));
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(endpoint.connection_count(), 0);
    assert_eq!(endpoint.get_port(id), None);
}

#[test]
fn test_create_client_adopts_connected_socket() {
    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, events) = RecordingClient::new();

    let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let local_port = stream.local_addr().unwrap().port();
    let id = endpoint
        .create_client(NativeSocket::Stream(stream), &client)
        .unwrap();
    let mut peer = accept_peer(&peer_listener);

    assert_eq!(endpoint.get_port(id), Some(local_port));
    assert!(!endpoint.is_listening(id));

    peer.write_all(b"adopted").unwrap();
    assert_eq!(collect_received_bytes(&events, id, 7), b"adopted");

    endpoint.send(id, b"ok");
    assert_eq!(read_exactly_with_timeout(&mut peer, 2).unwrap(), b"ok");

    drop(peer);
    assert!(wait_for_close(&events, id));
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());
}
