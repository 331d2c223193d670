//! Token hand-off routes.
//!
//! A signed-in client asks for a short-lived token, carries it out of band
//! (a QR code, a deep link) to another device, and that device trades it
//! for the ticket.
//!
//! - `POST /token` with a resolving ticket header → `{ "token": … }`
//! - `POST /token/exchange` with `{ "token": … }` → `{ "ticket": … }`
//!
//! `POST /token` reads the ticket attached by
//! [`SessionLayer`](crate::SessionLayer), so the router must sit behind it.

use crate::error::AppError;
use crate::extractors::SessionTicket;
use crate::service::SharedSessionService;
use crate::WebResult;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /token/exchange`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Token to trade.
    pub token: String,
}

/// Response of `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Freshly minted token, valid for five minutes.
    pub token: String,
}

/// Response of `POST /token/exchange`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    /// Ticket the token stood in for.
    pub ticket: String,
}

/// Router serving the token hand-off routes.
///
/// # Example
///
/// ```ignore
/// let service: SharedSessionService = Arc::new(manager);
///
/// let app = token_router(service.clone()).layer(SessionLayer::new(service));
/// ```
pub fn token_router(service: SharedSessionService) -> Router {
    Router::new()
        .route("/token", post(create_token))
        .route("/token/exchange", post(exchange_token))
        .with_state(service)
}

async fn create_token(
    State(service): State<SharedSessionService>,
    SessionTicket(ticket): SessionTicket,
) -> WebResult<Json<TokenResponse>> {
    let token = service.create_token(&ticket).await?;
    Ok(Json(TokenResponse { token }))
}

async fn exchange_token(
    State(service): State<SharedSessionService>,
    body: Result<Json<ExchangeRequest>, JsonRejection>,
) -> WebResult<Json<TicketResponse>> {
    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let ticket = service.exchange_token(&request.token).await?;
    Ok(Json(TicketResponse { ticket }))
}
