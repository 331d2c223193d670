//! # EqSession Core
//!
//! Records, store contracts and configuration for the session indirection
//! layer.
//!
//! Session payloads are stored under an internal identity that is never
//! handed to clients. Clients hold a **ticket** instead: a long-lived, high
//! entropy credential that resolves to the identity. A ticket can in turn be
//! traded for a **token**, an 8-character code that expires after five
//! minutes and resolves back to the ticket. Tokens are meant to be typed by
//! hand on a second device.
//!
//! ```text
//! token ──exchange──▶ ticket ──resolve──▶ identity ──▶ session payload
//!  (300 s)            (30 days)
//! ```
//!
//! This crate holds no I/O. Backends implement the traits in [`store`],
//! and the session manager in `eq-session` composes them.

pub mod config;
pub mod environment;
pub mod error;
pub mod record;
pub mod store;

// Re-export main types for convenience
pub use config::{CollectionNames, SessionConfig, DEFAULT_TICKET_TTL_SECONDS, TOKEN_TTL_SECONDS};
pub use environment::{Clock, IdGenerator, SystemClock};
pub use error::{Result, SessionError};
pub use record::{SessionData, SessionRecord, TicketRecord, TokenRecord};
pub use store::{InsertOutcome, SessionDataStore, TicketStore, TokenStore};
