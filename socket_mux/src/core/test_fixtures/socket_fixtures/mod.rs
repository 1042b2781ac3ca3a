// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod recording_capabilities;
pub mod tracking_socket_backend;
pub mod wait_helpers;

// Re-export.
pub use recording_capabilities::*;
pub use tracking_socket_backend::*;
pub use wait_helpers::*;
