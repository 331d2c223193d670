//! Object-safe view of a session manager.
//!
//! [`SessionManager`] is generic over its stores, which makes it awkward to
//! carry through a router. [`SessionService`] erases those parameters so the
//! middleware and handlers can share one `Arc<dyn SessionService>`.

use eq_session::SessionManager;
use eq_session_core::{
    Clock, IdGenerator, Result, SessionData, SessionDataStore, TicketStore, TokenStore,
};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// Shared handle to a session service, as stored in router state.
pub type SharedSessionService = Arc<dyn SessionService>;

/// Session operations needed at the HTTP edge.
pub trait SessionService: Send + Sync {
    /// Resolve `ticket` to its payload, projected to `columns`.
    ///
    /// `None` when the ticket is unknown or expired.
    fn ticket_session<'a>(
        &'a self,
        ticket: &'a str,
        columns: &'a [String],
    ) -> BoxFuture<'a, Result<Option<SessionData>>>;

    /// Mint a token standing in for `ticket`.
    fn create_token<'a>(&'a self, ticket: &'a str) -> BoxFuture<'a, Result<String>>;

    /// Trade `token` for the ticket it was minted from.
    fn exchange_token<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<String>>;
}

impl<D, T, K, G, C> SessionService for SessionManager<D, T, K, G, C>
where
    D: SessionDataStore,
    T: TicketStore,
    K: TokenStore,
    G: IdGenerator,
    C: Clock,
{
    fn ticket_session<'a>(
        &'a self,
        ticket: &'a str,
        columns: &'a [String],
    ) -> BoxFuture<'a, Result<Option<SessionData>>> {
        async move {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            self.get_ticket_session(ticket, &columns).await
        }
        .boxed()
    }

    fn create_token<'a>(&'a self, ticket: &'a str) -> BoxFuture<'a, Result<String>> {
        SessionManager::create_token(self, ticket).boxed()
    }

    fn exchange_token<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<String>> {
        SessionManager::exchange_token(self, token).boxed()
    }
}
