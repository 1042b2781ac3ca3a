// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::TracingConfig;
use tracing::dispatcher;
use tracing_core::LevelFilter;

/// Global scope tracing setup. Accepts anything that converts into a [`TracingConfig`]:
/// a [`tracing::Level`], a [`LevelFilter`], a [`DisplayPreference`], a [`WriterConfig`],
/// or a full config.
///
/// Does nothing if the level filter is [`LevelFilter::OFF`].
///
/// # Errors
///
/// Returns an error if the log file can't be created, or if a global subscriber has
/// already been installed in this process.
///
/// [`DisplayPreference`]: super::DisplayPreference
/// [`WriterConfig`]: super::WriterConfig
pub fn try_initialize_logging_global(
    options: impl Into<TracingConfig>,
) -> miette::Result<()> {
    let it: TracingConfig = options.into();

    // Early return if the level filter is off.
    if matches!(it.get_level_filter(), LevelFilter::OFF) {
        return Ok(());
    }

    it.install_global()
}

/// Thread local scope tracing setup, handy in tests. Returns [`None`] if the level
/// filter is [`LevelFilter::OFF`]; otherwise events on the current thread are captured
/// until the returned guard is dropped.
///
/// Events emitted by the endpoint's worker thread are not captured by a thread local
/// subscriber. Use [`try_initialize_logging_global()`] for those.
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_initialize_logging_thread_local(
    options: impl Into<TracingConfig>,
) -> miette::Result<Option<dispatcher::DefaultGuard>> {
    let it: TracingConfig = options.into();

    // Early return if the level filter is off.
    if matches!(it.get_level_filter(), LevelFilter::OFF) {
        return Ok(None);
    }

    it.install_thread_local().map(Some)
}
