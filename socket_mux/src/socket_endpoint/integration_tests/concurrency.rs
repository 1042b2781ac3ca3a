// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Endpoint calls from many threads at once, and from inside callbacks on the worker
//! thread.

use super::test_helpers::*;
use crate::{Client, ConnectionId, DEFAULT_WAIT_TIMEOUT, NativeSocketBackend,
            RecordingClient, SocketEndpoint, collect_received_bytes, is_closed_by_peer,
            read_exactly_with_timeout, wait_until};
use pretty_assertions::assert_eq;
use std::{collections::HashSet,
          io::Write as _,
          net::TcpStream,
          sync::{Arc, OnceLock, Weak,
                 atomic::{AtomicBool, AtomicUsize, Ordering},
                 mpsc::{Sender, channel}}};

#[test]
fn test_concurrent_connects_get_unique_ids() {
    const THREAD_COUNT: usize = 8;

    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let (client, _events) = RecordingClient::new();

    let ids: Vec<ConnectionId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREAD_COUNT)
            .map(|_| scope.spawn(|| endpoint.connect_inet("127.0.0.1", port, &client)))
            .collect();
        handles
            .into_iter()
            .map(|it| it.join().unwrap().unwrap())
            .collect()
    });

    let _peers: Vec<TcpStream> = (0..THREAD_COUNT)
        .map(|_| accept_peer(&peer_listener))
        .collect();

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), THREAD_COUNT);
    assert_eq!(endpoint.connection_count(), THREAD_COUNT);
}

/// Sends every received chunk straight back, from the worker thread.
#[derive(Debug, Default)]
struct EchoClient {
    endpoint: OnceLock<Weak<SocketEndpoint>>,
}

impl Client for EchoClient {
    fn did_receive(&self, id: ConnectionId, bytes: Vec<u8>) {
        if let Some(weak) = self.endpoint.get()
            && let Some(endpoint) = weak.upgrade()
        {
            endpoint.send(id, &bytes);
        }
    }

    fn did_close(&self, _id: ConnectionId) {}
}

#[test]
fn test_send_from_did_receive() {
    let endpoint = Arc::new(create_endpoint(NativeSocketBackend));
    let (peer_listener, port) = create_peer_listener();
    let client = Arc::new(EchoClient::default());
    client.endpoint.set(Arc::downgrade(&endpoint)).unwrap();

    let _id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);

    peer.write_all(b"marco").unwrap();
    assert_eq!(read_exactly_with_timeout(&mut peer, 5).unwrap(), b"marco");
}

/// Opens a replacement connection from inside `did_close`.
#[derive(Debug)]
struct ReconnectingClient {
    endpoint: OnceLock<Weak<SocketEndpoint>>,
    port: u16,
    replacement: Arc<RecordingClient>,
    reconnected: Sender<Option<ConnectionId>>,
}

impl Client for ReconnectingClient {
    fn did_receive(&self, _id: ConnectionId, _bytes: Vec<u8>) {}

    fn did_close(&self, _id: ConnectionId) {
        if let Some(weak) = self.endpoint.get()
            && let Some(endpoint) = weak.upgrade()
        {
            let new_id = endpoint.connect_inet("127.0.0.1", self.port, &self.replacement);
            let _unused = self.reconnected.send(new_id);
        }
    }
}

#[test]
fn test_connect_from_did_close() {
    let endpoint = Arc::new(create_endpoint(NativeSocketBackend));
    let (peer_listener, port) = create_peer_listener();
    let (replacement, replacement_events) = RecordingClient::new();
    let (reconnected_sender, reconnected) = channel();
    let client = Arc::new(ReconnectingClient {
        endpoint: OnceLock::new(),
        port,
        replacement,
        reconnected: reconnected_sender,
    });
    client.endpoint.set(Arc::downgrade(&endpoint)).unwrap();

    let first_id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    drop(accept_peer(&peer_listener));

    let new_id = reconnected.recv_timeout(DEFAULT_WAIT_TIMEOUT).unwrap().unwrap();
    assert_ne!(new_id, first_id);
    assert_eq!(endpoint.connection_count(), 1);

    let mut peer = accept_peer(&peer_listener);
    peer.write_all(b"again").unwrap();
    assert_eq!(collect_received_bytes(&replacement_events, new_id, 5), b"again");
}

/// Invalidates itself on the first byte it sees.
#[derive(Debug, Default)]
struct SelfInvalidatingClient {
    endpoint: OnceLock<Weak<SocketEndpoint>>,
    me: OnceLock<Weak<SelfInvalidatingClient>>,
    closes: AtomicUsize,
}

impl Client for SelfInvalidatingClient {
    fn did_receive(&self, _id: ConnectionId, _bytes: Vec<u8>) {
        if let Some(endpoint) = self.endpoint.get().and_then(Weak::upgrade)
            && let Some(me) = self.me.get().and_then(Weak::upgrade)
        {
            endpoint.invalidate_client(&me);
        }
    }

    fn did_close(&self, _id: ConnectionId) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_invalidate_from_own_callback() {
    let endpoint = Arc::new(create_endpoint(NativeSocketBackend));
    let (peer_listener, port) = create_peer_listener();
    let client = Arc::new(SelfInvalidatingClient::default());
    client.endpoint.set(Arc::downgrade(&endpoint)).unwrap();
    client.me.set(Arc::downgrade(&client)).unwrap();

    let _id = endpoint.connect_inet("127.0.0.1", port, &client).unwrap();
    let mut peer = accept_peer(&peer_listener);
    peer.write_all(b"x").unwrap();

    assert!(is_closed_by_peer(&mut peer).unwrap());
    assert_eq!(endpoint.connection_count(), 0);
    assert_eq!(client.closes.load(Ordering::SeqCst), 0);
}

/// Counts received bytes and drops them.
#[derive(Debug, Default)]
struct CountingClient {
    received: AtomicUsize,
}

impl Client for CountingClient {
    fn did_receive(&self, _id: ConnectionId, bytes: Vec<u8>) {
        self.received.fetch_add(bytes.len(), Ordering::SeqCst);
    }

    fn did_close(&self, _id: ConnectionId) {}
}

#[test]
fn test_flooding_peer_does_not_starve_quiet_peer() {
    const CHUNK_LEN: usize = 256 * 1_024;

    let endpoint = create_endpoint(NativeSocketBackend);
    let (peer_listener, port) = create_peer_listener();
    let flood_client = Arc::new(CountingClient::default());
    let (quiet_client, quiet_events) = RecordingClient::new();

    let _flood_id = endpoint
        .connect_inet("127.0.0.1", port, &flood_client)
        .unwrap();
    let mut flood_peer = accept_peer(&peer_listener);
    let quiet_id = endpoint
        .connect_inet("127.0.0.1", port, &quiet_client)
        .unwrap();
    let mut quiet_peer = accept_peer(&peer_listener);

    let stop = Arc::new(AtomicBool::new(false));
    let flood_thread = std::thread::spawn({
        let stop = Arc::clone(&stop);
        move || {
            let chunk = vec![b'x'; CHUNK_LEN];
            while !stop.load(Ordering::SeqCst) {
                if flood_peer.write_all(&chunk).is_err() {
                    break;
                }
            }
        }
    });

    // The worker is busy with the flood before the quiet peer speaks.
    assert!(wait_until(DEFAULT_WAIT_TIMEOUT, || {
        flood_client.received.load(Ordering::SeqCst) >= CHUNK_LEN
    }));

    quiet_peer.write_all(b"hi").unwrap();
    assert_eq!(collect_received_bytes(&quiet_events, quiet_id, 2), b"hi");

    stop.store(true, Ordering::SeqCst);
    flood_thread.join().unwrap();
}
