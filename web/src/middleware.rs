//! Ticket header middleware.
//!
//! Reads a ticket from the `X-Eq-Session` header (configurable), resolves it
//! through a [`SessionService`], and attaches the result to the request.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use eq_session_web::{SessionLayer, CurrentSession};
//!
//! let service: SharedSessionService = Arc::new(manager);
//!
//! let app = Router::new()
//!     .route("/me", get(|CurrentSession(s): CurrentSession| async move { Json(s) }))
//!     .layer(SessionLayer::new(service).with_columns(["name", "email"]));
//! ```
//!
//! # Flow
//!
//! 1. **Read** the header. Absent, empty or not visible ASCII → pass through
//! 2. **Resolve** the ticket to its payload, projected to the configured columns
//! 3. **Attach** [`SessionTicket`] and [`CurrentSession`] to request extensions
//! 4. A ticket that does not resolve passes through with nothing attached
//! 5. A store failure short-circuits with a 500 [`AppError`] response

use crate::error::AppError;
use crate::extractors::{CurrentSession, SessionTicket};
use crate::service::SharedSessionService;
use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, HeaderName};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Default header carrying the ticket.
pub const SESSION_HEADER: &str = "X-Eq-Session";

/// Layer that resolves session tickets on every request.
#[derive(Clone)]
pub struct SessionLayer {
    service: SharedSessionService,
    header: HeaderName,
    columns: Arc<[String]>,
}

impl SessionLayer {
    /// Resolve tickets from [`SESSION_HEADER`] and attach the whole payload.
    #[must_use]
    pub fn new(service: SharedSessionService) -> Self {
        Self {
            service,
            header: HeaderName::from_static("x-eq-session"),
            columns: Arc::from(Vec::<String>::new()),
        }
    }

    /// Read the ticket from `header` instead.
    #[must_use]
    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Attach only these payload fields (plus `"id"`).
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

/// Middleware service produced by [`SessionLayer`].
#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
    layer: SessionLayer,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let ticket = presented_ticket(req.headers(), &self.layer.header);
        let service = Arc::clone(&self.layer.service);
        let columns = Arc::clone(&self.layer.columns);

        // The readied inner service handles this request; a fresh clone
        // waits for the next poll_ready.
        let ready = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, ready);

        let span = tracing::debug_span!(
            "session",
            method = %req.method(),
            uri = %req.uri(),
            presented = ticket.is_some(),
        );

        Box::pin(
            async move {
                if let Some(ticket) = ticket {
                    match service.ticket_session(&ticket, &columns).await {
                        Ok(Some(session)) => {
                            tracing::debug!(fields = session.len(), "Session attached");
                            req.extensions_mut().insert(CurrentSession(session));
                            req.extensions_mut().insert(SessionTicket(ticket));
                        }
                        Ok(None) => tracing::debug!("Ticket did not resolve"),
                        Err(err) => return Ok(AppError::from(err).into_response()),
                    }
                }

                inner.call(req).await
            }
            .instrument(span),
        )
    }
}

/// Ticket in `header`, if present and usable.
fn presented_ticket(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
