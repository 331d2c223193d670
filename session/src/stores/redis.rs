//! Redis-based store implementation.
//!
//! # Architecture
//!
//! Records are JSON-serialized under namespaced keys:
//!
//! - **Session payload**: `{store}:{id}`, no expiry
//! - **Ticket**: `{ticket}:{ticket_value}`, expires after the ticket TTL
//! - **Token**: `{token}:{token_value}`, expires after the token TTL
//!
//! where `{store}`, `{ticket}` and `{token}` are the configured collection
//! names.
//!
//! # Uniqueness and Expiry
//!
//! Tickets and tokens are written with `SET key value NX PXAT expiry`, where
//! `expiry` is the record's `updated_at + ttl` in Unix milliseconds: the
//! existence check, the write and the expiry are one atomic command, so two
//! concurrent writers of the same value cannot both succeed. Redis deletes
//! the key once its server clock passes that instant. Consuming a token is a
//! single `GETDEL`. Both commands need Redis 6.2 or later.
//!
//! # Example
//!
//! ```no_run
//! use eq_session::stores::RedisStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisStore::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use eq_session_core::{
    CollectionNames, InsertOutcome, Result, SessionData, SessionDataStore, SessionError,
    SessionRecord, TicketRecord, TicketStore, TokenRecord, TokenStore,
};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// `Redis` store for session payloads, tickets and tokens.
///
/// # Thread Safety
///
/// This type is `Clone` and can be safely shared across tasks.
/// Each clone shares the same `ConnectionManager`.
#[derive(Clone)]
pub struct RedisStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,

    /// Key namespaces.
    collections: CollectionNames,
}

impl RedisStore {
    /// Create a new `Redis` store with the default collection names.
    ///
    /// # Connection URL Format
    ///
    /// - TCP: `redis://[:password@]host[:port][/database]`
    /// - TLS: `rediss://[:password@]host[:port][/database]`
    ///
    /// # Errors
    ///
    /// Returns error if the URL is malformed or the connection fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        Self::with_collections(redis_url, CollectionNames::default()).await
    }

    /// Create a new `Redis` store using `collections` as key namespaces.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is malformed or the connection fails.
    pub async fn with_collections(redis_url: &str, collections: CollectionNames) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            SessionError::Storage(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            SessionError::Storage(format!("Failed to create Redis connection manager: {e}"))
        })?;

        tracing::info!(
            store = %collections.store,
            ticket = %collections.ticket,
            token = %collections.token,
            "RedisStore initialized successfully"
        );

        Ok(Self {
            conn_manager,
            collections,
        })
    }

    fn key(collection: &str, key: &str) -> String {
        format!("{collection}:{key}")
    }

    async fn get_json<R: DeserializeOwned>(&self, key: &str) -> Result<Option<R>> {
        let mut conn = self.conn_manager.clone();

        let bytes: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to read from Redis: {e}")))?;

        bytes
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| SessionError::Serialization(e.to_string()))
            })
            .transpose()
    }

    /// `SET key value NX PXAT expires_at`.
    async fn set_unique<R: Serialize>(
        &self,
        key: &str,
        record: &R,
        expires_at: DateTime<Utc>,
    ) -> Result<InsertOutcome> {
        let mut conn = self.conn_manager.clone();

        let bytes =
            serde_json::to_vec(record).map_err(|e| SessionError::Serialization(e.to_string()))?;

        // Nil reply means the key is already held
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(bytes)
            .arg("NX")
            .arg("PXAT")
            .arg(expiry_millis(expires_at))
            .query_async(&mut conn)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to write to Redis: {e}")))?;

        Ok(if reply.is_some() {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Conflict
        })
    }
}

/// Unix milliseconds of `expires_at`, clamped to the positive range `PXAT` accepts.
#[allow(clippy::cast_sign_loss)]
fn expiry_millis(expires_at: DateTime<Utc>) -> u64 {
    expires_at.timestamp_millis().max(1) as u64
}

impl SessionDataStore for RedisStore {
    async fn find_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        self.get_json(&Self::key(&self.collections.store, id)).await
    }

    async fn upsert_session(
        &self,
        id: &str,
        data: SessionData,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let key = Self::key(&self.collections.store, id);

        // Read-then-write: concurrent writers are last-write-wins, and at
        // worst `created_at` is taken from the losing write.
        let record = match self.get_json::<SessionRecord>(&key).await? {
            Some(existing) => existing.replaced(data, now),
            None => SessionRecord::new(id, data, now),
        };

        let bytes =
            serde_json::to_vec(&record).map_err(|e| SessionError::Serialization(e.to_string()))?;

        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .set(&key, bytes)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to store session: {e}")))?;

        Ok(record)
    }
}

impl TicketStore for RedisStore {
    async fn find_ticket(&self, ticket: &str) -> Result<Option<TicketRecord>> {
        self.get_json(&Self::key(&self.collections.ticket, ticket)).await
    }

    async fn insert_ticket(&self, record: &TicketRecord, ttl: Duration) -> Result<InsertOutcome> {
        let key = Self::key(&self.collections.ticket, &record.ticket);
        self.set_unique(&key, record, record.updated_at + ttl).await
    }
}

impl TokenStore for RedisStore {
    async fn find_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        self.get_json(&Self::key(&self.collections.token, token)).await
    }

    async fn insert_token(&self, record: &TokenRecord, ttl: Duration) -> Result<InsertOutcome> {
        let key = Self::key(&self.collections.token, &record.token);
        self.set_unique(&key, record, record.updated_at + ttl).await
    }

    async fn take_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let mut conn = self.conn_manager.clone();
        let key = Self::key(&self.collections.token, token);

        // GETDEL: read and delete in one command, so one caller wins
        let bytes: Option<Vec<u8>> = conn.get_del(&key).await.map_err(|e| {
            SessionError::Storage(format!("Failed to consume token from Redis: {e}"))
        })?;

        bytes
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| SessionError::Serialization(e.to_string()))
            })
            .transpose()
    }
}
