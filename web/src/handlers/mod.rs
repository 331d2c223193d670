//! HTTP request handlers.

pub mod tokens;

pub use tokens::{token_router, ExchangeRequest, TicketResponse, TokenResponse};
