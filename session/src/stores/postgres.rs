//! `PostgreSQL` store implementation.
//!
//! Each collection is a table named after the configured collection name.
//! `PostgreSQL` has no native row expiry, so ticket and token rows carry an
//! `expires_at` column: lookups ignore rows past it, inserts may overwrite
//! them, and [`PostgresStore::purge_expired`] deletes them using the
//! `expires_at` index. Run the purge periodically.
//!
//! `expires_at` is computed from the record's `updated_at` (application
//! clock) and compared against the database's `now()`.
//!
//! Unique insert is `INSERT … ON CONFLICT DO UPDATE … WHERE expires_at <= now()`:
//! a live row is left untouched and reported as a conflict.
//!
//! # Example
//!
//! ```no_run
//! use eq_session::stores::PostgresStore;
//! use eq_session_core::CollectionNames;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/sessions").await?;
//! let store = PostgresStore::new(pool, CollectionNames::default())?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use eq_session_core::{
    CollectionNames, InsertOutcome, Result, SessionData, SessionDataStore, SessionError,
    SessionRecord, TicketRecord, TicketStore, TokenRecord, TokenStore,
};
use sqlx::types::Json;
use sqlx::PgPool;

type SessionRow = (String, Json<SessionData>, DateTime<Utc>, DateTime<Utc>);
type CredentialRow = (String, String, DateTime<Utc>, DateTime<Utc>);

/// `PostgreSQL` store for session payloads, tickets and tokens.
#[derive(Clone)]
pub struct PostgresStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,

    /// Table names.
    collections: CollectionNames,
}

impl PostgresStore {
    /// Create a new `PostgreSQL` store.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if a collection name is not a
    /// plain SQL identifier (ASCII letters, digits and `_`, not starting
    /// with a digit).
    pub fn new(pool: PgPool, collections: CollectionNames) -> Result<Self> {
        for name in [&collections.store, &collections.ticket, &collections.token] {
            if !is_identifier(name) {
                return Err(SessionError::Configuration(format!(
                    "collection name {name:?} is not a valid table name"
                )));
            }
        }

        Ok(Self { pool, collections })
    }

    /// Create tables and expiry indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns error if a statement fails.
    pub async fn migrate(&self) -> Result<()> {
        let CollectionNames {
            store,
            ticket,
            token,
        } = &self.collections;

        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS {store} (
                    id TEXT PRIMARY KEY,
                    data JSONB NOT NULL DEFAULT '{{}}',
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {ticket} (
                    ticket TEXT PRIMARY KEY,
                    id TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL
                )"
            ),
            format!("CREATE INDEX IF NOT EXISTS {ticket}_expires_at_idx ON {ticket} (expires_at)"),
            format!(
                "CREATE TABLE IF NOT EXISTS {token} (
                    token TEXT PRIMARY KEY,
                    ticket TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL
                )"
            ),
            format!("CREATE INDEX IF NOT EXISTS {token}_expires_at_idx ON {token} (expires_at)"),
        ];

        for statement in &statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| SessionError::Storage(format!("Migration failed: {e}")))?;
        }

        tracing::info!(store = %store, ticket = %ticket, token = %token, "Session tables ready");
        Ok(())
    }

    /// Delete expired ticket and token rows.
    ///
    /// # Returns
    ///
    /// Number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns error if a statement fails.
    pub async fn purge_expired(&self) -> Result<u64> {
        let mut removed = 0;

        for table in [&self.collections.ticket, &self.collections.token] {
            removed += sqlx::query(&format!("DELETE FROM {table} WHERE expires_at <= now()"))
                .execute(&self.pool)
                .await
                .map_err(|e| SessionError::Storage(format!("Failed to purge {table}: {e}")))?
                .rows_affected();
        }

        if removed > 0 {
            tracing::debug!(removed = removed, "Purged expired records");
        }

        Ok(removed)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn outcome(rows_affected: u64) -> InsertOutcome {
    if rows_affected > 0 {
        InsertOutcome::Inserted
    } else {
        InsertOutcome::Conflict
    }
}

impl SessionDataStore for PostgresStore {
    async fn find_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let store = &self.collections.store;

        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT id, data, created_at, updated_at FROM {store} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to get session: {e}")))?;

        Ok(row.map(|(id, Json(data), created_at, updated_at)| SessionRecord {
            id,
            data,
            created_at,
            updated_at,
        }))
    }

    async fn upsert_session(
        &self,
        id: &str,
        data: SessionData,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let store = &self.collections.store;

        let (id, Json(data), created_at, updated_at): SessionRow = sqlx::query_as(&format!(
            "INSERT INTO {store} (id, data, created_at, updated_at)
             VALUES ($1, $2, $3, $3)
             ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
             RETURNING id, data, created_at, updated_at"
        ))
        .bind(id)
        .bind(Json(data))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to store session: {e}")))?;

        Ok(SessionRecord {
            id,
            data,
            created_at,
            updated_at,
        })
    }
}

impl TicketStore for PostgresStore {
    async fn find_ticket(&self, ticket: &str) -> Result<Option<TicketRecord>> {
        let table = &self.collections.ticket;

        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT ticket, id, created_at, updated_at FROM {table}
             WHERE ticket = $1 AND expires_at > now()"
        ))
        .bind(ticket)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to get ticket: {e}")))?;

        Ok(row.map(|(ticket, id, created_at, updated_at)| TicketRecord {
            ticket,
            id,
            created_at,
            updated_at,
        }))
    }

    async fn insert_ticket(&self, record: &TicketRecord, ttl: Duration) -> Result<InsertOutcome> {
        let table = &self.collections.ticket;

        let result = sqlx::query(&format!(
            "INSERT INTO {table} (ticket, id, created_at, updated_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (ticket) DO UPDATE SET
                 id = EXCLUDED.id,
                 created_at = EXCLUDED.created_at,
                 updated_at = EXCLUDED.updated_at,
                 expires_at = EXCLUDED.expires_at
             WHERE {table}.expires_at <= now()"
        ))
        .bind(&record.ticket)
        .bind(&record.id)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.updated_at + ttl)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to store ticket: {e}")))?;

        Ok(outcome(result.rows_affected()))
    }
}

impl TokenStore for PostgresStore {
    async fn find_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let table = &self.collections.token;

        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT token, ticket, created_at, updated_at FROM {table}
             WHERE token = $1 AND expires_at > now()"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to get token: {e}")))?;

        Ok(row.map(|(token, ticket, created_at, updated_at)| TokenRecord {
            token,
            ticket,
            created_at,
            updated_at,
        }))
    }

    async fn insert_token(&self, record: &TokenRecord, ttl: Duration) -> Result<InsertOutcome> {
        let table = &self.collections.token;

        let result = sqlx::query(&format!(
            "INSERT INTO {table} (token, ticket, created_at, updated_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (token) DO UPDATE SET
                 ticket = EXCLUDED.ticket,
                 created_at = EXCLUDED.created_at,
                 updated_at = EXCLUDED.updated_at,
                 expires_at = EXCLUDED.expires_at
             WHERE {table}.expires_at <= now()"
        ))
        .bind(&record.token)
        .bind(&record.ticket)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.updated_at + ttl)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to store token: {e}")))?;

        Ok(outcome(result.rows_affected()))
    }

    async fn take_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let table = &self.collections.token;

        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "DELETE FROM {table} WHERE token = $1 AND expires_at > now()
             RETURNING token, ticket, created_at, updated_at"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("Failed to consume token: {e}")))?;

        Ok(row.map(|(token, ticket, created_at, updated_at)| TokenRecord {
            token,
            ticket,
            created_at,
            updated_at,
        }))
    }
}
