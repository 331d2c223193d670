//! In-process store.
//!
//! Keeps all three collections in `tokio` `RwLock`-protected maps. Expiry is
//! evaluated against the injected [`Clock`]: lookups never see an expired
//! ticket or token, and an insert may reuse an expired key.
//!
//! Dead rows are reclaimed by the inserts themselves: once a table reaches
//! its sweep mark, the insert drops every expired row and moves the mark to
//! twice the surviving size (never below [`SWEEP_THRESHOLD`]). Memory thus
//! stays proportional to the live population, at amortized constant cost
//! per insert. [`MemoryStore::purge_expired`] sweeps on demand.
//!
//! Suitable for tests and single-process deployments. Clones share state.

use chrono::{DateTime, Duration, Utc};
use eq_session_core::{
    Clock, InsertOutcome, Result, SessionData, SessionDataStore, SessionRecord, SystemClock,
    TicketRecord, TicketStore, TokenRecord, TokenStore,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Smallest table size that triggers a sweep on insert.
pub const SWEEP_THRESHOLD: usize = 1024;

/// A record together with the instant it stops being visible.
#[derive(Debug, Clone)]
struct Expiring<R> {
    record: R,
    expires_at: DateTime<Utc>,
}

impl<R> Expiring<R> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Expiring rows keyed by credential value.
#[derive(Debug)]
struct Table<R> {
    rows: HashMap<String, Expiring<R>>,
    sweep_at: usize,
}

impl<R: Clone> Table<R> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }

    fn live(&self, key: &str, now: DateTime<Utc>) -> Option<R> {
        self.rows
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.record.clone())
    }

    fn take_live(&mut self, key: &str, now: DateTime<Utc>) -> Option<R> {
        self.rows
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.record)
    }

    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, entry| entry.is_live(now));
        before - self.rows.len()
    }

    /// Insert `record` under `key` unless a live entry already holds it.
    fn insert_unique(
        &mut self,
        key: &str,
        record: R,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> InsertOutcome {
        let entry = Expiring { record, expires_at };

        match self.rows.entry(key.to_string()) {
            Entry::Occupied(existing) if existing.get().is_live(now) => {
                return InsertOutcome::Conflict;
            }
            Entry::Occupied(mut expired) => {
                expired.insert(entry);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }

        if self.rows.len() >= self.sweep_at {
            let removed = self.sweep(now);
            self.sweep_at = (self.rows.len() * 2).max(SWEEP_THRESHOLD);
            tracing::debug!(
                removed = removed,
                remaining = self.rows.len(),
                "Swept expired records"
            );
        }

        InsertOutcome::Inserted
    }
}

/// In-memory store for session payloads, tickets and tokens.
#[derive(Debug, Clone)]
pub struct MemoryStore<C = SystemClock> {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
    tickets: Arc<RwLock<Table<TicketRecord>>>,
    tokens: Arc<RwLock<Table<TokenRecord>>>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    /// Create an empty store expiring against wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    /// Create an empty store expiring against `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tickets: Arc::new(RwLock::new(Table::new())),
            tokens: Arc::new(RwLock::new(Table::new())),
            clock,
        }
    }

    /// Drop every expired ticket and token now.
    ///
    /// # Returns
    ///
    /// Number of records removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();

        let removed = self.tickets.write().await.sweep(now) + self.tokens.write().await.sweep(now);

        if removed > 0 {
            tracing::debug!(removed = removed, "Purged expired records");
        }

        removed
    }

    /// Number of stored ticket rows, expired-but-unswept included.
    pub async fn ticket_rows(&self) -> usize {
        self.tickets.read().await.rows.len()
    }

    /// Number of stored token rows, expired-but-unswept included.
    pub async fn token_rows(&self) -> usize {
        self.tokens.read().await.rows.len()
    }

    /// Number of stored session payloads.
    pub async fn session_rows(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl<C: Clock> SessionDataStore for MemoryStore<C> {
    async fn find_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn upsert_session(
        &self,
        id: &str,
        data: SessionData,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let mut sessions = self.sessions.write().await;

        let record = match sessions.remove(id) {
            Some(existing) => existing.replaced(data, now),
            None => SessionRecord::new(id, data, now),
        };
        sessions.insert(id.to_string(), record.clone());

        Ok(record)
    }
}

impl<C: Clock> TicketStore for MemoryStore<C> {
    async fn find_ticket(&self, ticket: &str) -> Result<Option<TicketRecord>> {
        let now = self.clock.now();
        Ok(self.tickets.read().await.live(ticket, now))
    }

    async fn insert_ticket(&self, record: &TicketRecord, ttl: Duration) -> Result<InsertOutcome> {
        let now = self.clock.now();
        let mut tickets = self.tickets.write().await;

        Ok(tickets.insert_unique(&record.ticket, record.clone(), record.updated_at + ttl, now))
    }
}

impl<C: Clock> TokenStore for MemoryStore<C> {
    async fn find_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let now = self.clock.now();
        Ok(self.tokens.read().await.live(token, now))
    }

    async fn insert_token(&self, record: &TokenRecord, ttl: Duration) -> Result<InsertOutcome> {
        let now = self.clock.now();
        let mut tokens = self.tokens.write().await;

        Ok(tokens.insert_unique(&record.token, record.clone(), record.updated_at + ttl, now))
    }

    async fn take_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let now = self.clock.now();
        Ok(self.tokens.write().await.take_live(token, now))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use eq_session_testing::ManualClock;

    fn ttl() -> Duration {
        Duration::minutes(5)
    }

    #[tokio::test]
    async fn test_insert_and_find_ticket() {
        let store = MemoryStore::new();
        let record = TicketRecord::new("ticket-1", "user-1", Utc::now());

        let outcome = store.insert_ticket(&record, ttl()).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);

        let found = store.find_ticket("ticket-1").await.unwrap();
        assert_eq!(found, Some(record));
        assert!(store.find_ticket("ticket-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_live_ticket_conflicts() {
        let store = MemoryStore::new();
        let first = TicketRecord::new("same", "user-1", Utc::now());
        let second = TicketRecord::new("same", "user-2", Utc::now());

        store.insert_ticket(&first, ttl()).await.unwrap();
        let outcome = store.insert_ticket(&second, ttl()).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Conflict);
        // The first binding is untouched
        let found = store.find_ticket("same").await.unwrap().unwrap();
        assert_eq!(found.id, "user-1");
    }

    #[tokio::test]
    async fn test_expired_ticket_is_invisible_and_reusable() {
        let store = MemoryStore::new();
        let stale = TicketRecord::new("old", "user-1", Utc::now() - Duration::minutes(10));

        store.insert_ticket(&stale, ttl()).await.unwrap();
        assert!(store.find_ticket("old").await.unwrap().is_none());
        assert_eq!(store.ticket_rows().await, 1);

        let fresh = TicketRecord::new("old", "user-2", Utc::now());
        let outcome = store.insert_ticket(&fresh, ttl()).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(store.find_ticket("old").await.unwrap().unwrap().id, "user-2");
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired_rows() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .insert_ticket(&TicketRecord::new("dead", "a", now - Duration::hours(1)), ttl())
            .await
            .unwrap();
        store
            .insert_ticket(&TicketRecord::new("live", "b", now), ttl())
            .await
            .unwrap();
        store
            .insert_token(&TokenRecord::new("DEADTOKN", "dead", now - Duration::hours(1)), ttl())
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await, 2);
        assert_eq!(store.ticket_rows().await, 1);
        assert_eq!(store.token_rows().await, 0);
    }

    #[tokio::test]
    async fn test_take_token_returns_live_record_once() {
        let store = MemoryStore::new();
        let record = TokenRecord::new("ABCDEFGH", "ticket", Utc::now());
        store.insert_token(&record, ttl()).await.unwrap();

        assert_eq!(store.take_token("ABCDEFGH").await.unwrap(), Some(record));
        assert_eq!(store.take_token("ABCDEFGH").await.unwrap(), None);
        assert!(store.find_token("ABCDEFGH").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_expired_token_is_none() {
        let store = MemoryStore::new();
        let stale = TokenRecord::new("OLDTOKEN", "ticket", Utc::now() - Duration::minutes(10));
        store.insert_token(&stale, ttl()).await.unwrap();

        assert_eq!(store.take_token("OLDTOKEN").await.unwrap(), None);
        assert_eq!(store.token_rows().await, 0);
    }

    #[tokio::test]
    async fn test_inserts_reclaim_expired_rows() {
        const ROUND: usize = 1000;
        let clock = ManualClock::default();
        let store = MemoryStore::with_clock(clock.clone());

        for round in 0..5 {
            for i in 0..ROUND {
                let record = TokenRecord::new(format!("R{round}T{i:04}"), "ticket", clock.now());
                store.insert_token(&record, ttl()).await.unwrap();
            }
            clock.advance(Duration::seconds(301));
        }

        // Without any purge call, at most two rounds stay resident
        assert!(store.token_rows().await <= 2 * ROUND);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_rows() {
        let clock = ManualClock::default();
        let store = MemoryStore::with_clock(clock.clone());

        for i in 0..(3 * SWEEP_THRESHOLD) {
            let record = TicketRecord::new(format!("ticket-{i}"), "user", clock.now());
            store.insert_ticket(&record, ttl()).await.unwrap();
        }

        assert_eq!(store.ticket_rows().await, 3 * SWEEP_THRESHOLD);
        assert!(store.find_ticket("ticket-0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_payload() {
        let store = MemoryStore::new();
        let mut first = SessionData::new();
        first.insert("a".to_string(), serde_json::json!(1));
        let mut second = SessionData::new();
        second.insert("b".to_string(), serde_json::json!(2));

        let created = store.upsert_session("user", first, Utc::now()).await.unwrap();
        let replaced = store
            .upsert_session("user", second.clone(), Utc::now())
            .await
            .unwrap();

        assert_eq!(replaced.data, second);
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(store.session_rows().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();

        store
            .insert_ticket(&TicketRecord::new("shared", "user", Utc::now()), ttl())
            .await
            .unwrap();

        assert!(clone.find_ticket("shared").await.unwrap().is_some());
    }
}
