// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Public fixtures for testing code that uses a [`SocketEndpoint`].
//!
//! [`SocketEndpoint`]: crate::SocketEndpoint

// Attach sources.
pub mod socket_fixtures;

// Re-export.
pub use socket_fixtures::*;
