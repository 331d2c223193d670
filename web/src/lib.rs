//! Axum integration for eq-session.
//!
//! Puts a [`SessionManager`](eq_session::SessionManager) at the HTTP edge:
//!
//! - [`SessionLayer`] resolves the ticket in the `X-Eq-Session` header and
//!   attaches the session to the request
//! - [`SessionTicket`] and [`CurrentSession`] extract what the layer attached
//! - [`token_router`] serves the token hand-off routes
//! - [`AppError`] maps [`SessionError`](eq_session_core::SessionError) to
//!   JSON error responses
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives carrying `X-Eq-Session: <ticket>`
//! 2. **Resolve** the ticket through the [`SessionService`]
//! 3. **Attach** ticket and payload to request extensions
//! 4. **Extract** them in handlers
//! 5. **Map errors** to HTTP responses
//!
//! # Example
//!
//! ```ignore
//! use eq_session::{SessionConfig, SessionEnvironment, SessionManager};
//! use eq_session_web::{token_router, CurrentSession, SessionLayer, SharedSessionService};
//! use axum::{routing::get, Json, Router};
//!
//! let manager = SessionManager::new(SessionEnvironment::shared(store), SessionConfig::default())?;
//! let service: SharedSessionService = Arc::new(manager);
//!
//! let app = Router::new()
//!     .route("/me", get(|CurrentSession(s): CurrentSession| async move { Json(s) }))
//!     .merge(token_router(service.clone()))
//!     .layer(SessionLayer::new(service));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod service;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CurrentSession, SessionTicket};
pub use handlers::token_router;
pub use middleware::{SessionLayer, SessionMiddleware, SESSION_HEADER};
pub use service::{SessionService, SharedSessionService};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
