//! Session configuration.
//!
//! Values are supplied by the application; only the defaults live here.

use crate::error::{Result, SessionError};
use chrono::Duration;

/// Default ticket lifetime: 30 days.
pub const DEFAULT_TICKET_TTL_SECONDS: i64 = 60 * 60 * 24 * 30;

/// Token lifetime. Fixed, tokens are a narrow hand-off channel.
pub const TOKEN_TTL_SECONDS: i64 = 300;

/// Collection (table or key namespace) names used by the store backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    /// Session payloads keyed by identity.
    ///
    /// Default: `session_store`
    pub store: String,

    /// Ticket records.
    ///
    /// Default: `session_ticket`
    pub ticket: String,

    /// Token records.
    ///
    /// Default: `session_token`
    pub token: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            store: "session_store".to_string(),
            ticket: "session_ticket".to_string(),
            token: "session_token".to_string(),
        }
    }
}

/// Session manager configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ticket time-to-live, measured from the last write.
    ///
    /// Default: 30 days
    pub ticket_ttl: Duration,

    /// Collection names.
    pub collections: CollectionNames,

    /// Delete a token when it is exchanged.
    ///
    /// Default: `false` (a token may be exchanged repeatedly until it expires)
    pub consume_token_on_exchange: bool,
}

impl SessionConfig {
    /// Create configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set ticket time-to-live.
    #[must_use]
    pub const fn with_ticket_ttl(mut self, ttl: Duration) -> Self {
        self.ticket_ttl = ttl;
        self
    }

    /// Override collection names.
    #[must_use]
    pub fn with_collections(mut self, collections: CollectionNames) -> Self {
        self.collections = collections;
        self
    }

    /// Delete tokens on exchange instead of letting them live out their TTL.
    #[must_use]
    pub const fn with_consume_token_on_exchange(mut self, consume: bool) -> Self {
        self.consume_token_on_exchange = consume;
        self
    }

    /// Token time-to-live.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::seconds(TOKEN_TTL_SECONDS)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if the ticket TTL is not
    /// positive, is not longer than the token TTL, or a collection name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.ticket_ttl <= Duration::zero() {
            return Err(SessionError::Configuration(
                "ticket TTL must be positive".to_string(),
            ));
        }

        if self.ticket_ttl <= self.token_ttl() {
            return Err(SessionError::Configuration(format!(
                "ticket TTL ({}s) must exceed token TTL ({TOKEN_TTL_SECONDS}s)",
                self.ticket_ttl.num_seconds()
            )));
        }

        let names = [
            &self.collections.store,
            &self.collections.ticket,
            &self.collections.token,
        ];
        if names.iter().any(|name| name.is_empty()) {
            return Err(SessionError::Configuration(
                "collection names must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ticket_ttl: Duration::seconds(DEFAULT_TICKET_TTL_SECONDS),
            collections: CollectionNames::default(),
            consume_token_on_exchange: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();

        assert_eq!(config.ticket_ttl.num_seconds(), 2_592_000);
        assert_eq!(config.token_ttl().num_seconds(), 300);
        assert_eq!(config.collections.store, "session_store");
        assert_eq!(config.collections.ticket, "session_ticket");
        assert_eq!(config.collections.token, "session_token");
        assert!(!config.consume_token_on_exchange);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_ticket_ttl() {
        let config = SessionConfig::new().with_ticket_ttl(Duration::zero());
        assert!(matches!(config.validate(), Err(SessionError::Configuration(_))));
    }

    #[test]
    fn test_rejects_ticket_ttl_below_token_ttl() {
        let config = SessionConfig::new().with_ticket_ttl(Duration::seconds(60));
        assert!(matches!(config.validate(), Err(SessionError::Configuration(_))));
    }

    #[test]
    fn test_rejects_empty_collection_name() {
        let config = SessionConfig::new().with_collections(CollectionNames {
            ticket: String::new(),
            ..CollectionNames::default()
        });
        assert!(matches!(config.validate(), Err(SessionError::Configuration(_))));
    }
}
