//! Stored record types.
//!
//! Three record kinds live in three independent collections:
//!
//! - [`SessionRecord`]: payload keyed by the internal identity, never expires
//! - [`TicketRecord`]: long-lived credential bound to one identity
//! - [`TokenRecord`]: short-lived hand-off code standing in for one ticket

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session payload.
///
/// The payload is opaque to this layer apart from being a field map, which
/// is what column projection and ticket enrichment operate on.
pub type SessionData = serde_json::Map<String, serde_json::Value>;

/// Session payload stored under an internal identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Internal identity (unique).
    pub id: String,

    /// Payload, replaced wholesale on every write.
    pub data: SessionData,

    /// First write.
    pub created_at: DateTime<Utc>,

    /// Last write.
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a record for a first write at `now`.
    #[must_use]
    pub fn new(id: impl Into<String>, data: SessionData, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the payload, keeping the creation time.
    #[must_use]
    pub fn replaced(self, data: SessionData, now: DateTime<Utc>) -> Self {
        Self {
            data,
            updated_at: now,
            ..self
        }
    }
}

/// Ticket bound to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Ticket value (unique among live tickets).
    pub ticket: String,

    /// Identity this ticket authenticates for. Never changes.
    pub id: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last write; the ticket TTL counts from here.
    pub updated_at: DateTime<Utc>,
}

impl TicketRecord {
    /// Create a ticket record issued at `now`.
    #[must_use]
    pub fn new(ticket: impl Into<String>, id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            ticket: ticket.into(),
            id: id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has outlived `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_expired(self.updated_at, now, ttl)
    }
}

/// Token standing in for a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token value (unique among live tokens).
    pub token: String,

    /// Ticket this token was minted from.
    pub ticket: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last write; the token TTL counts from here.
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Create a token record minted at `now`.
    #[must_use]
    pub fn new(token: impl Into<String>, ticket: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            ticket: ticket.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has outlived `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_expired(self.updated_at, now, ttl)
    }
}

fn is_expired(updated_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(updated_at) >= ttl
}
