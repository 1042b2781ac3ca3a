// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The arena that owns every [`Connection`]. See [`ConnectionRegistry`].

use super::{Connection, ConnectionId, PollDescriptor, WeakClient, WeakListener};
use std::{collections::HashMap,
          os::fd::AsRawFd,
          sync::{Mutex, MutexGuard, PoisonError}};

/// Both tables behind one mutex, so connect, listen, accept, send, and invalidate all
/// observe one consistent snapshot.
#[allow(missing_debug_implementations)]
pub struct ConnectionRegistry<H> {
    tables: Mutex<ConnectionTables<H>>,
}

impl<H: AsRawFd> ConnectionRegistry<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(ConnectionTables::new()),
        }
    }

    /// Callbacks never run while this guard is held, and the tables have no cross-entry
    /// invariants a panic could break, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, ConnectionTables<H>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: AsRawFd> Default for ConnectionRegistry<H> {
    fn default() -> Self { Self::new() }
}

/// Active and listening entries. An id lives in exactly one of the two maps.
#[allow(missing_debug_implementations)]
pub struct ConnectionTables<H> {
    active: HashMap<ConnectionId, Connection<H>>,
    listening: HashMap<ConnectionId, Connection<H>>,
}

impl<H: AsRawFd> ConnectionTables<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
            listening: HashMap::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.active.contains_key(&id) || self.listening.contains_key(&id)
    }

    /// Fresh id, unused in both tables.
    #[must_use]
    pub fn generate_id(&self) -> ConnectionId {
        ConnectionId::generate_unique(|candidate| self.contains(candidate))
    }

    pub fn insert_active(&mut self, socket: H, client: WeakClient) -> ConnectionId {
        let id = self.generate_id();
        self.active
            .insert(id, Connection::new_active(id, socket, client));
        id
    }

    pub fn insert_listening(
        &mut self,
        socket: H,
        listener: WeakListener,
        client: WeakClient,
    ) -> ConnectionId {
        let id = self.generate_id();
        self.listening
            .insert(id, Connection::new_listening(id, socket, listener, client));
        id
    }

    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<&Connection<H>> {
        self.active.get(&id).or_else(|| self.listening.get(&id))
    }

    #[must_use]
    pub fn get_active(&self, id: ConnectionId) -> Option<&Connection<H>> {
        self.active.get(&id)
    }

    pub fn get_active_mut(&mut self, id: ConnectionId) -> Option<&mut Connection<H>> {
        self.active.get_mut(&id)
    }

    #[must_use]
    pub fn get_listening(&self, id: ConnectionId) -> Option<&Connection<H>> {
        self.listening.get(&id)
    }

    #[must_use]
    pub fn is_listening(&self, id: ConnectionId) -> bool {
        self.listening.contains_key(&id)
    }

    pub fn remove_active(&mut self, id: ConnectionId) -> Option<Connection<H>> {
        self.active.remove(&id)
    }

    /// Removes (and returns) every active entry matching `predicate`.
    pub fn remove_active_where(
        &mut self,
        predicate: impl Fn(&Connection<H>) -> bool,
    ) -> Vec<Connection<H>> {
        remove_where(&mut self.active, predicate)
    }

    /// Removes (and returns) every listening entry matching `predicate`.
    pub fn remove_listening_where(
        &mut self,
        predicate: impl Fn(&Connection<H>) -> bool,
    ) -> Vec<Connection<H>> {
        remove_where(&mut self.listening, predicate)
    }

    /// One descriptor per entry across both tables.
    pub fn pollables(&self) -> impl Iterator<Item = (ConnectionId, PollDescriptor)> + '_ {
        self.listening
            .values()
            .chain(self.active.values())
            .map(|connection| (connection.id, connection.pollable()))
    }

    pub fn drain_all(&mut self) -> Vec<Connection<H>> {
        self.listening
            .drain()
            .chain(self.active.drain())
            .map(|(_, connection)| connection)
            .collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize { self.active.len() }

    #[must_use]
    pub fn listening_count(&self) -> usize { self.listening.len() }
}

impl<H: AsRawFd> Default for ConnectionTables<H> {
    fn default() -> Self { Self::new() }
}

fn remove_where<H>(
    table: &mut HashMap<ConnectionId, Connection<H>>,
    predicate: impl Fn(&Connection<H>) -> bool,
) -> Vec<Connection<H>> {
    let ids: Vec<ConnectionId> = table
        .iter()
        .filter(|(_, connection)| predicate(connection))
        .map(|(id, _)| *id)
        .collect();
    ids.iter().filter_map(|id| table.remove(id)).collect()
}
