//! # EqSession
//!
//! Session indirection for HTTP services: payloads are stored under an
//! internal identity, and clients only ever see opaque credentials that
//! resolve to it.
//!
//! ## Features
//!
//! - **Tickets**: 32 random bytes, base64, valid for 30 days by default
//! - **Tokens**: 8 typable characters, valid for 5 minutes, exchanged for a ticket
//! - **Lock-free uniqueness**: unique-constraint inserts with redraw on collision
//! - **Pluggable stores**: in-memory, `Redis`, `PostgreSQL`
//!
//! ## Example: Cross-Device Login
//!
//! ```rust
//! use eq_session::{SessionConfig, SessionEnvironment, SessionManager};
//! use eq_session_core::SystemClock;
//!
//! # async fn example() -> eq_session::Result<()> {
//! let manager = SessionManager::new(
//!     SessionEnvironment::in_memory(SystemClock),
//!     SessionConfig::default(),
//! )?;
//!
//! // Device A logs in and receives a ticket
//! let ticket = manager.create_ticket("user-42").await?;
//!
//! // Device A displays a short code...
//! let token = manager.create_token(&ticket).await?;
//!
//! // ...which device B types in and trades for the same ticket
//! assert_eq!(manager.exchange_token(&token).await?, ticket);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod environment;
pub mod generator;
pub mod manager;
pub mod stores;

// Re-export main types for convenience
pub use environment::SessionEnvironment;
pub use eq_session_core::{
    CollectionNames, InsertOutcome, Result, SessionConfig, SessionData, SessionError,
};
pub use generator::RandomIdGenerator;
pub use manager::{SessionManager, TICKET_FIELD};
pub use stores::MemoryStore;

/// Session manager over a single in-process store.
pub type MemorySessionManager<C = eq_session_core::SystemClock> =
    SessionManager<MemoryStore<C>, MemoryStore<C>, MemoryStore<C>, RandomIdGenerator, C>;
