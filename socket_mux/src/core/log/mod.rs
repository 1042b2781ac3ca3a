// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tracing setup for binaries and tests that embed the socket endpoint.
//!
//! The library itself only emits events through [`tracing`] macros and never installs a
//! subscriber. Call [`try_initialize_logging_global()`] (or the thread local variant in
//! tests) to see them.
//!
//! ```no_run
//! use r3bl_socket_mux::{DisplayPreference, try_initialize_logging_global};
//! try_initialize_logging_global(DisplayPreference::Stderr).unwrap();
//! ```

// Attach sources.
pub mod log_public_api;
pub mod rolling_file_appender_impl;
pub mod tracing_config;
pub mod tracing_init;

// Re-export.
pub use log_public_api::*;
pub use rolling_file_appender_impl::*;
pub use tracing_config::*;
pub use tracing_init::*;
