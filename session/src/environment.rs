//! Session environment.
//!
//! This module defines the environment type for dependency injection
//! into the session manager.

use crate::generator::RandomIdGenerator;
use crate::stores::MemoryStore;
use eq_session_core::{Clock, IdGenerator, SessionDataStore, SystemClock, TicketStore, TokenStore};

/// Session environment.
///
/// Contains all external dependencies needed by the session manager.
///
/// # Type Parameters
///
/// - `D`: Session payload store
/// - `T`: Ticket store
/// - `K`: Token store
/// - `G`: Identifier generator
/// - `C`: Clock
#[derive(Clone)]
pub struct SessionEnvironment<D, T, K, G = RandomIdGenerator, C = SystemClock>
where
    D: SessionDataStore,
    T: TicketStore,
    K: TokenStore,
    G: IdGenerator,
    C: Clock,
{
    /// Session payload store.
    pub sessions: D,

    /// Ticket store.
    pub tickets: T,

    /// Token store.
    pub tokens: K,

    /// Identifier generator.
    pub ids: G,

    /// Clock used to stamp records.
    pub clock: C,
}

impl<D, T, K, G, C> SessionEnvironment<D, T, K, G, C>
where
    D: SessionDataStore,
    T: TicketStore,
    K: TokenStore,
    G: IdGenerator,
    C: Clock,
{
    /// Create a new session environment.
    #[must_use]
    pub const fn new(sessions: D, tickets: T, tokens: K, ids: G, clock: C) -> Self {
        Self {
            sessions,
            tickets,
            tokens,
            ids,
            clock,
        }
    }
}

impl<C> SessionEnvironment<MemoryStore<C>, MemoryStore<C>, MemoryStore<C>, RandomIdGenerator, C>
where
    C: Clock + Clone,
{
    /// All three collections in one in-process store, expiring against `clock`.
    #[must_use]
    pub fn in_memory(clock: C) -> Self {
        let store = MemoryStore::with_clock(clock.clone());
        Self::new(store.clone(), store.clone(), store, RandomIdGenerator, clock)
    }
}

impl<S> SessionEnvironment<S, S, S, RandomIdGenerator, SystemClock>
where
    S: SessionDataStore + TicketStore + TokenStore + Clone,
{
    /// All three collections in one backend, with random identifiers and
    /// wall-clock time.
    #[must_use]
    pub fn shared(store: S) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store,
            RandomIdGenerator,
            SystemClock,
        )
    }
}
