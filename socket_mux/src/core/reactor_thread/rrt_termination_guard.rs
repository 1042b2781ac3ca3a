// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [RAII] guard that marks the dedicated thread as terminated on exit. See
//! [`TerminationGuard`] for details.
//!
//! [RAII]: https://en.wikipedia.org/wiki/Resource_acquisition_is_initialization

use super::RRTLiveness;
use std::sync::Arc;

/// [RAII] guard that calls [`RRTLiveness::mark_terminated()`] when the dedicated
/// thread's work loop exits, whether it returned normally or is unwinding from a panic.
///
/// [RAII]: https://en.wikipedia.org/wiki/Resource_acquisition_is_initialization
#[allow(missing_debug_implementations)]
pub struct TerminationGuard {
    pub liveness: Arc<RRTLiveness>,
}

impl Drop for TerminationGuard {
    fn drop(&mut self) { self.liveness.mark_terminated(); }
}
