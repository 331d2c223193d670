//! Session manager.
//!
//! Orchestrates ticket issuance, identity resolution, token issuance and
//! exchange, and payload reads and writes.
//!
//! # Credential Lifecycle
//!
//! ```text
//! (none) ──create_ticket──▶ Ticket(valid) ──ticket TTL──▶ (gone)
//!                                │
//!                           create_token
//!                                ▼
//!                          Token(valid) ──exchange_token──▶ ticket
//!                                │
//!                            token TTL ──▶ (gone)
//! ```
//!
//! Expiry is revocation: the store drops records once they outlive their
//! TTL, and an expired credential is indistinguishable from one that was
//! never issued.
//!
//! # Uniqueness
//!
//! Tickets and tokens are drawn at random and written with a
//! unique-constraint insert. A collision writes nothing and reports
//! [`InsertOutcome::Conflict`], and the manager draws again. There is no
//! retry bound: with 256 bits per ticket a second collision is not a
//! practical event, and for tokens the live population is bounded by the
//! five minute TTL. Store failures are never retried.

use crate::environment::SessionEnvironment;
use eq_session_core::{
    Clock, IdGenerator, InsertOutcome, Result, SessionConfig, SessionData, SessionDataStore,
    SessionError, TicketRecord, TicketStore, TokenRecord, TokenStore,
};

/// Field added to a ticket-resolved payload, holding the presented ticket.
pub const TICKET_FIELD: &str = "id";

/// Session manager.
///
/// Owns the lifecycle of session, ticket and token records. Stateless
/// beyond its injected dependencies: every operation is a short sequence of
/// store round trips, safe to run concurrently from many tasks.
#[derive(Clone)]
pub struct SessionManager<D, T, K, G, C>
where
    D: SessionDataStore,
    T: TicketStore,
    K: TokenStore,
    G: IdGenerator,
    C: Clock,
{
    env: SessionEnvironment<D, T, K, G, C>,
    config: SessionConfig,
}

impl<D, T, K, G, C> SessionManager<D, T, K, G, C>
where
    D: SessionDataStore,
    T: TicketStore,
    K: TokenStore,
    G: IdGenerator,
    C: Clock,
{
    /// Create a session manager.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if `config` does not validate.
    pub fn new(env: SessionEnvironment<D, T, K, G, C>, config: SessionConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            ticket_ttl_seconds = config.ticket_ttl.num_seconds(),
            token_ttl_seconds = config.token_ttl().num_seconds(),
            consume_token_on_exchange = config.consume_token_on_exchange,
            "Session manager initialized"
        );

        Ok(Self { env, config })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issue a new ticket for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the ticket cannot be persisted.
    pub async fn create_ticket(&self, id: &str) -> Result<String> {
        let ttl = self.config.ticket_ttl;

        loop {
            let record = TicketRecord::new(self.env.ids.ticket(), id, self.env.clock.now());

            match self.env.tickets.insert_ticket(&record, ttl).await? {
                InsertOutcome::Inserted => {
                    metrics::counter!("eq_session.tickets.issued").increment(1);
                    tracing::info!(
                        id = id,
                        ticket = %redact(&record.ticket),
                        "Issued ticket"
                    );
                    return Ok(record.ticket);
                }
                InsertOutcome::Conflict => {
                    metrics::counter!("eq_session.collisions", "kind" => "ticket").increment(1);
                    tracing::debug!("Ticket collision, drawing again");
                }
            }
        }
    }

    /// Resolve a ticket to the identity it was issued for.
    ///
    /// # Returns
    ///
    /// `None` if the ticket is unknown or expired.
    ///
    /// # Errors
    ///
    /// Returns error if the store lookup fails.
    pub async fn get_id(&self, ticket: &str) -> Result<Option<String>> {
        let id = self
            .env
            .tickets
            .find_ticket(ticket)
            .await?
            .map(|record| record.id);

        match &id {
            Some(id) => tracing::debug!(id = %id, ticket = %redact(ticket), "Ticket resolved"),
            None => {
                tracing::debug!(ticket = %redact(ticket), "Ticket not found (expired or never issued)");
            }
        }

        Ok(id)
    }

    /// Store `data` as the whole payload for `id`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the write fails.
    pub async fn set_session(&self, id: &str, data: SessionData) -> Result<()> {
        let fields = data.len();
        self.env
            .sessions
            .upsert_session(id, data, self.env.clock.now())
            .await?;

        tracing::debug!(id = id, fields = fields, "Stored session data");
        Ok(())
    }

    /// Read the payload for `id`.
    ///
    /// An absent payload reads as empty. With a non-empty `columns`, only
    /// those fields are returned; requested fields that are not present are
    /// omitted.
    ///
    /// # Errors
    ///
    /// Returns error if the store lookup fails.
    pub async fn get_session(&self, id: &str, columns: &[&str]) -> Result<SessionData> {
        let data = self
            .env
            .sessions
            .find_session(id)
            .await?
            .map(|record| record.data)
            .unwrap_or_default();

        let data = project(data, columns);
        tracing::debug!(id = id, fields = data.len(), "Read session data");

        Ok(data)
    }

    /// Read the payload behind a ticket.
    ///
    /// The result carries an extra [`TICKET_FIELD`] set to `ticket` itself,
    /// applied after projection.
    ///
    /// # Returns
    ///
    /// `None` if the ticket does not resolve. A resolving ticket with no
    /// stored payload yields `{ "id": ticket }`.
    ///
    /// # Errors
    ///
    /// Returns error if a store lookup fails.
    pub async fn get_ticket_session(
        &self,
        ticket: &str,
        columns: &[&str],
    ) -> Result<Option<SessionData>> {
        let Some(id) = self.get_id(ticket).await? else {
            return Ok(None);
        };

        let mut data = self.get_session(&id, columns).await?;
        data.insert(
            TICKET_FIELD.to_string(),
            serde_json::Value::String(ticket.to_string()),
        );

        Ok(Some(data))
    }

    /// Mint a token standing in for `ticket`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTicket`] if the ticket is unknown or expired
    /// - [`SessionError::Storage`] if a lookup or the insert fails
    pub async fn create_token(&self, ticket: &str) -> Result<String> {
        let Some(ticket_record) = self.env.tickets.find_ticket(ticket).await? else {
            metrics::counter!("eq_session.credential.rejected", "kind" => "ticket").increment(1);
            tracing::warn!(ticket = %redact(ticket), "Token requested for unknown ticket");
            return Err(SessionError::InvalidTicket);
        };

        let ttl = self.config.token_ttl();

        loop {
            let record = TokenRecord::new(
                self.env.ids.token(),
                ticket_record.ticket.as_str(),
                self.env.clock.now(),
            );

            match self.env.tokens.insert_token(&record, ttl).await? {
                InsertOutcome::Inserted => {
                    metrics::counter!("eq_session.tokens.issued").increment(1);
                    tracing::info!(
                        id = %ticket_record.id,
                        ticket = %redact(&ticket_record.ticket),
                        "Issued token"
                    );
                    return Ok(record.token);
                }
                InsertOutcome::Conflict => {
                    metrics::counter!("eq_session.collisions", "kind" => "token").increment(1);
                    tracing::debug!("Token collision, drawing again");
                }
            }
        }
    }

    /// Trade a token for the ticket it was minted from.
    ///
    /// Unless `consume_token_on_exchange` is set, the token stays valid until
    /// its TTL elapses and may be exchanged again. When it is set, the token
    /// is taken from the store in one atomic step and only one of several
    /// concurrent exchanges succeeds.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidToken`] if the token is unknown, expired or
    ///   already consumed
    /// - [`SessionError::Storage`] if a store operation fails
    pub async fn exchange_token(&self, token: &str) -> Result<String> {
        let found = if self.config.consume_token_on_exchange {
            self.env.tokens.take_token(token).await?
        } else {
            self.env.tokens.find_token(token).await?
        };

        let Some(record) = found else {
            metrics::counter!("eq_session.credential.rejected", "kind" => "token").increment(1);
            tracing::warn!("Exchange attempted with unknown token");
            return Err(SessionError::InvalidToken);
        };

        metrics::counter!("eq_session.tokens.exchanged").increment(1);
        tracing::info!(ticket = %redact(&record.ticket), "Exchanged token");

        Ok(record.ticket)
    }
}

/// Keep only `columns` of `data`; an empty selection keeps everything.
fn project(data: SessionData, columns: &[&str]) -> SessionData {
    if columns.is_empty() {
        return data;
    }

    data.into_iter()
        .filter(|(key, _)| columns.contains(&key.as_str()))
        .collect()
}

/// Loggable prefix of a credential.
fn redact(credential: &str) -> String {
    let prefix: String = credential.chars().take(4).collect();
    format!("{prefix}…")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> SessionData {
        match value {
            serde_json::Value::Object(map) => map,
            _ => SessionData::new(),
        }
    }

    #[test]
    fn test_project_without_columns_keeps_all() {
        let payload = data(json!({"key1": "v1", "key2": "v2"}));
        assert_eq!(project(payload.clone(), &[]), payload);
    }

    #[test]
    fn test_project_selects_columns() {
        let payload = data(json!({"key1": "v1", "key2": "v2"}));
        assert_eq!(project(payload, &["key2"]), data(json!({"key2": "v2"})));
    }

    #[test]
    fn test_project_omits_missing_columns() {
        let payload = data(json!({"key1": "v1"}));
        assert_eq!(project(payload, &["key1", "absent"]), data(json!({"key1": "v1"})));
        assert!(project(data(json!({"key1": "v1"})), &["absent"]).is_empty());
    }

    #[test]
    fn test_redact_keeps_short_prefix() {
        assert_eq!(redact("ABCDEFGH"), "ABCD…");
        assert_eq!(redact("AB"), "AB…");
    }
}
