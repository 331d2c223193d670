//! Session extractors.
//!
//! Both read what [`SessionLayer`](crate::SessionLayer) attached to the
//! request. Without the layer, or when the presented ticket did not resolve,
//! they reject with 401. Wrap in `Option<_>` for routes that serve anonymous
//! callers too.
//!
//! # Examples
//!
//! ```ignore
//! use eq_session_web::{CurrentSession, SessionTicket};
//!
//! async fn profile(CurrentSession(session): CurrentSession) -> Json<SessionData> {
//!     Json(session)
//! }
//!
//! async fn landing(session: Option<CurrentSession>) -> &'static str {
//!     if session.is_some() { "welcome back" } else { "hello" }
//! }
//! ```

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use eq_session_core::SessionData;

/// Ticket presented in the session header, known to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket(pub String);

/// Payload behind the presented ticket.
///
/// Carries the ticket itself under `"id"`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSession(pub SessionData);

#[async_trait]
impl<S> FromRequestParts<S> for SessionTicket
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Session ticket required"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Session ticket required"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    fn parts() -> Parts {
        Request::builder().uri("/").body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_ticket_from_extensions() {
        let mut parts = parts();
        parts
            .extensions
            .insert(SessionTicket("abc".to_string()));

        let ticket = SessionTicket::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ticket, SessionTicket("abc".to_string()));
    }

    #[tokio::test]
    async fn test_session_from_extensions() {
        let mut data = SessionData::new();
        data.insert("id".to_string(), json!("abc"));
        let mut parts = parts();
        parts.extensions.insert(CurrentSession(data.clone()));

        let CurrentSession(session) = CurrentSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(session, data);
    }

    #[tokio::test]
    async fn test_missing_rejects_unauthorized() {
        let mut parts = parts();

        let err = SessionTicket::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = CurrentSession::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_optional_extraction() {
        let mut parts = parts();
        let session = Option::<CurrentSession>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(session.is_none());
    }
}
