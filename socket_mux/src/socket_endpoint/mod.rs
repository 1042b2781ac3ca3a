// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll kqueue wakeup

//! Socket connection multiplexer.
//!
//! A [`SocketEndpoint`] manages many outbound and listening sockets through a single
//! dedicated worker thread that blocks in [`mio`] (epoll/kqueue). Any thread may call
//! [`connect_inet()`], [`listen_inet()`], [`send()`], and the `invalidate_*` methods;
//! bytes and closures are delivered back through the [`Client`] and [`Listener`]
//! callbacks, on the worker thread.
//!
//! # Architecture
//!
//! ```text
//! caller threads                 ConnectionRegistry (one Mutex)
//! ┌──────────────┐  lock+mutate  ┌──────────────────────────────┐
//! │ connect_inet │ ────────────► │ active:    id → Connection   │
//! │ listen_inet  │               │ listening: id → Connection   │
//! │ send         │               └──────────────┬───────────────┘
//! │ invalidate_* │                    snapshot  │ (under the lock)
//! └──────┬───────┘                              ▼
//!        │ wake (1 byte)          ┌─────────────────────────────┐
//!        └──────────────────────► │ EndpointWorker (own thread) │
//!             wakeup channel      │ rebuild → poll → dispatch   │
//!                                 │  ├ accept_if_enabled        │
//!                                 │  ├ recv_if_enabled          │
//!                                 │  └ send_if_enabled          │
//!                                 └──────────────┬──────────────┘
//!                                                │ lock released
//!                                                ▼
//!                                   Client::did_receive / did_close
//!                                   Listener::did_accept
//! ```
//!
//! # Edge-triggered polling
//!
//! [`mio`] only reports a readiness *change*, so every handler works until the socket
//! would block: reads loop over fixed-size chunks, accepts loop over pending peers, and
//! flushes loop until the queue is empty. A flush that stops early re-arms its source so
//! it gets another writable event.
//!
//! [`connect_inet()`]: SocketEndpoint::connect_inet
//! [`listen_inet()`]: SocketEndpoint::listen_inet
//! [`send()`]: SocketEndpoint::send

/// Set to `true` to trace every read, write, accept, and wakeup.
pub const DEBUG_SOCKET_MUX_SHOW_IO: bool = false;

// Attach sources.
pub mod capabilities;
pub mod connection;
pub mod connection_id;
pub mod connection_registry;
pub mod dispatcher;
pub mod endpoint;
pub mod endpoint_config;
pub mod endpoint_shared;
pub mod global_endpoint;
pub mod handler_accept;
pub mod handler_recv;
pub mod handler_send;
pub mod native_socket;
pub mod socket_backend;
pub mod sources;
pub mod wakeup_channel;
pub mod worker;

#[cfg(any(test, doc))]
pub mod integration_tests;

// Re-export.
pub use capabilities::*;
pub use connection::*;
pub use connection_id::*;
pub use connection_registry::*;
pub use endpoint::*;
pub use endpoint_config::*;
pub use endpoint_shared::*;
pub use global_endpoint::*;
pub use native_socket::*;
pub use socket_backend::*;
pub use sources::*;
pub use wakeup_channel::*;
pub use worker::*;
