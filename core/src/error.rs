//! Error types for session indirection operations.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failure modes of the session layer.
///
/// Every operation reports through this type. An absent session is never an
/// error: lookups that find nothing return an empty value or `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    // ═══════════════════════════════════════════════════════════
    // Credential Errors
    // ═══════════════════════════════════════════════════════════

    /// A token was requested for a ticket that is unknown or expired.
    #[error("Wrong ticket")]
    InvalidTicket,

    /// A token that is unknown or expired was presented for exchange.
    #[error("Wrong token")]
    InvalidToken,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The underlying store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record could not be encoded for, or decoded from, the store.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The session configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl SessionError {
    /// Returns `true` if the failure originated in the store layer.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eq_session_core::SessionError;
    /// assert!(SessionError::Storage("connection reset".into()).is_storage_error());
    /// assert!(!SessionError::InvalidToken.is_storage_error());
    /// ```
    #[must_use]
    pub const fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Serialization(_))
    }

    /// Returns `true` if the caller presented a credential that does not resolve.
    ///
    /// # Examples
    ///
    /// ```
    /// # use eq_session_core::SessionError;
    /// assert!(SessionError::InvalidTicket.is_credential_error());
    /// assert!(!SessionError::Configuration("ttl".into()).is_credential_error());
    /// ```
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        matches!(self, Self::InvalidTicket | Self::InvalidToken)
    }
}
