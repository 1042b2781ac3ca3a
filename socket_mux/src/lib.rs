// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words epoll wakeup

//! # r3bl_socket_mux
//!
//! A socket connection multiplexer: many simultaneous outbound and listening TCP
//! sockets, driven by one dedicated reactor thread, behind a thread safe API.
//!
//! - [`SocketEndpoint`] is the entry point. Construct one explicitly, or use the lazy
//!   process-wide [`GLOBAL_SOCKET_ENDPOINT`].
//! - Implement [`Client`] (and [`Listener`] for servers) to receive bytes, closures, and
//!   accepted peers.
//! - [`SocketBackend`] abstracts the socket primitives; [`NativeSocketBackend`] is the
//!   production one and [`TrackingSocketBackend`] is for tests.
//!
//! The library emits [`tracing`] events and never installs a subscriber. See
//! [`try_initialize_logging_global()`].

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach modules (re-exported below to provide clean public API).
pub mod core;
pub mod socket_endpoint;

// Re-export stable public API using glob imports for ergonomic, flat API surface.
pub use core::*;
pub use socket_endpoint::*;
