//! Store traits.
//!
//! The store owns physical storage and expiry. Each collection is reached
//! through its own trait so deployments can mix backends (payloads in a
//! database, tickets and tokens in `Redis`).
//!
//! # Implementation Notes
//!
//! - Ticket and token lookups MUST NOT return records older than their TTL,
//!   whether the backend purges eagerly (`Redis` EX) or lazily.
//! - `insert_*` MUST be unique-constraint enforcing: when a live record with
//!   the same key exists, nothing is written and [`InsertOutcome::Conflict`]
//!   is returned. This is what makes concurrent issuance safe without locks.
//! - Session payloads never expire.
//!
//! # Expiry Instant
//!
//! A ticket or token stops being live at `updated_at + ttl`, fixed when it is
//! inserted. Every backend stores that instant (`Redis` `PXAT`, a
//! `PostgreSQL` `expires_at` column, the in-memory entry) and compares it
//! against its own clock: the injected [`Clock`](crate::Clock) for the
//! in-memory store, the server clock for `Redis` and `PostgreSQL`. Keep the
//! application and server clocks in sync.

use crate::error::Result;
use crate::record::{SessionData, SessionRecord, TicketRecord, TokenRecord};
use chrono::{DateTime, Duration, Utc};

/// Result of a unique insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted,

    /// A live record already holds this key; nothing was written.
    Conflict,
}

/// Session payload store.
pub trait SessionDataStore: Send + Sync {
    /// Find the payload for an identity.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn find_session(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<SessionRecord>>> + Send;

    /// Create or wholesale-replace the payload for an identity.
    ///
    /// An existing record keeps its `created_at`; its data is replaced,
    /// never merged.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn upsert_session(
        &self,
        id: &str,
        data: SessionData,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<SessionRecord>> + Send;
}

/// Ticket store.
pub trait TicketStore: Send + Sync {
    /// Find a live ticket.
    ///
    /// # Returns
    ///
    /// `None` if the ticket was never issued or has expired.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn find_ticket(
        &self,
        ticket: &str,
    ) -> impl std::future::Future<Output = Result<Option<TicketRecord>>> + Send;

    /// Insert a ticket unless a live one holds the same value.
    ///
    /// The record expires `ttl` after its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn insert_ticket(
        &self,
        record: &TicketRecord,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<InsertOutcome>> + Send;
}

/// Token store.
pub trait TokenStore: Send + Sync {
    /// Find a live token.
    ///
    /// # Returns
    ///
    /// `None` if the token was never issued, was deleted, or has expired.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn find_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<TokenRecord>>> + Send;

    /// Insert a token unless a live one holds the same value.
    ///
    /// The record expires `ttl` after its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn insert_token(
        &self,
        record: &TokenRecord,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<InsertOutcome>> + Send;

    /// Remove a live token and return it, atomically.
    ///
    /// # Returns
    ///
    /// The record if this call removed a live token, `None` otherwise. Of
    /// several concurrent takes of the same token, at most one observes it.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn take_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<TokenRecord>>> + Send;
}
