// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

pub const DEFAULT_READ_CHUNK_SIZE: usize = 4_096;
pub const DEFAULT_EVENTS_CAPACITY: usize = 64;
pub const DEFAULT_MAX_READS_PER_EVENT: usize = 16;
pub const DEFAULT_WORKER_THREAD_NAME: &str = "socket-endpoint-worker";
pub const DEFAULT_DEGRADED_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Tuning knobs for a [`SocketEndpoint`].
///
/// ```
/// use r3bl_socket_mux::EndpointConfig;
/// let config = EndpointConfig::default()
///     .with_read_chunk_size(1_024)
///     .with_worker_thread_name("debugger-sockets");
/// assert_eq!(config.read_chunk_size, 1_024);
/// ```
///
/// [`SocketEndpoint`]: super::SocketEndpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Size of each read. Every successful read becomes one `did_receive` call.
    pub read_chunk_size: usize,
    /// How many readiness events one poll can return.
    pub events_capacity: usize,
    /// Reads (or accepts, for a listener) done for one readiness event before moving on
    /// to the next ready socket. A socket with data left over is re-armed and served
    /// again on the next poll, so one busy peer can't starve the others.
    pub max_reads_per_event: usize,
    pub worker_thread_name: String,
    /// Only used when the wakeup channel could not be created, so the worker still
    /// notices registry changes (and teardown) within a bounded time.
    pub degraded_poll_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
            max_reads_per_event: DEFAULT_MAX_READS_PER_EVENT,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            degraded_poll_timeout: DEFAULT_DEGRADED_POLL_TIMEOUT,
        }
    }
}

impl EndpointConfig {
    /// Clamped to at least one byte.
    #[must_use]
    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size.max(1);
        self
    }

    /// Clamped to at least one event.
    #[must_use]
    pub fn with_events_capacity(mut self, events_capacity: usize) -> Self {
        self.events_capacity = events_capacity.max(1);
        self
    }

    /// Clamped to at least one read.
    #[must_use]
    pub fn with_max_reads_per_event(mut self, max_reads_per_event: usize) -> Self {
        self.max_reads_per_event = max_reads_per_event.max(1);
        self
    }

    #[must_use]
    pub fn with_worker_thread_name(mut self, worker_thread_name: impl Into<String>) -> Self {
        self.worker_thread_name = worker_thread_name.into();
        self
    }

    #[must_use]
    pub fn with_degraded_poll_timeout(mut self, degraded_poll_timeout: Duration) -> Self {
        self.degraded_poll_timeout = degraded_poll_timeout;
        self
    }
}
