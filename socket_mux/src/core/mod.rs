// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Building blocks that the [`socket_endpoint`] is assembled from: the dedicated
//! reactor thread framework, tracing setup, and public test fixtures.
//!
//! [`socket_endpoint`]: crate::socket_endpoint

// Attach sources.
pub mod common;
pub mod log;
pub mod reactor_thread;
pub mod test_fixtures;

// Re-export.
pub use common::*;
pub use log::*;
pub use reactor_thread::*;
pub use test_fixtures::*;
