// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! End-to-end tests for [`SocketEndpoint`] over real loopback sockets.
//!
//! Each test drives the endpoint from the test thread and plays the remote peer with a
//! plain blocking [`std::net`] socket. Callbacks arrive on the worker thread, so they are
//! observed through the channels of the [recording fixtures].
//!
//! | Test Module    | What it validates                                 |
//! |:---------------|:--------------------------------------------------|
//! | `data_flow`    | Receive, ordered send, partial writes, close once |
//! | `listening`    | Accept, reject, listener invalidation             |
//! | `invalidation` | Silent close of a client's connections            |
//! | `concurrency`  | Calls from many threads and from callbacks        |
//! | `lifecycle`    | Connect failure, degraded mode, teardown          |
//!
//! [`SocketEndpoint`]: crate::SocketEndpoint
//! [recording fixtures]: crate::test_fixtures::socket_fixtures::recording_capabilities

#[cfg(test)]
mod concurrency;

#[cfg(test)]
mod data_flow;

#[cfg(test)]
mod invalidation;

#[cfg(test)]
mod lifecycle;

#[cfg(test)]
mod listening;
