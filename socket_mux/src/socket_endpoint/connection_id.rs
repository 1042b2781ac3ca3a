// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words CSPRNG

use mio::Token;
use rand::Rng as _;
use std::{fmt::{Display, Formatter, Result},
          num::NonZeroUsize};

/// Opaque handle for one entry in either the active table or the listening table.
///
/// Callers only ever hold this value, never the socket behind it. Valid ids are nonzero
/// and never `usize::MAX` (reserved by [`mio`] for internal use), so every id maps 1:1
/// to a [`Token`] that can't collide with the wakeup channel's `Token(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(NonZeroUsize);

impl ConnectionId {
    /// Returns [`None`] for `0` and `usize::MAX`.
    #[must_use]
    pub const fn try_from_raw(raw: usize) -> Option<Self> {
        if raw == usize::MAX {
            return None;
        }
        match NonZeroUsize::new(raw) {
            Some(it) => Some(Self(it)),
            None => None,
        }
    }

    #[must_use]
    pub const fn as_usize(self) -> usize { self.0.get() }

    #[must_use]
    pub const fn to_token(self) -> Token { Token(self.0.get()) }

    #[must_use]
    pub const fn from_token(token: Token) -> Option<Self> { Self::try_from_raw(token.0) }

    /// Draws from the thread local CSPRNG over `1..usize::MAX` (every valid id) until
    /// `is_taken` rejects the value. With a 64 bit id space this loop practically never
    /// repeats.
    pub fn generate_unique(is_taken: impl Fn(ConnectionId) -> bool) -> Self {
        let mut rng = rand::rng();
        loop {
            let raw = rng.random_range(1..usize::MAX);
            if let Some(id) = Self::try_from_raw(raw)
                && !is_taken(id)
            {
                return id;
            }
        }
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result { write!(f, "{:#018x}", self.0.get()) }
}
