//! # EqSession Testing
//!
//! Testing utilities for the session indirection layer.
//!
//! This crate provides:
//! - `ManualClock`: time that only moves when a test says so
//! - `ScriptedIdGenerator`: predetermined tickets and tokens, for forcing collisions
//! - `FailingStore`: a store whose every operation fails
//! - `init_tracing`: log output captured by the test harness
//!
//! ## Example
//!
//! ```ignore
//! use eq_session_testing::ManualClock;
//!
//! #[tokio::test]
//! async fn test_ticket_expires() {
//!     let clock = ManualClock::default();
//!     let manager = SessionManager::new(SessionEnvironment::in_memory(clock.clone()), config)?;
//!
//!     let ticket = manager.create_ticket("user").await?;
//!     clock.advance(Duration::days(31));
//!
//!     assert!(manager.get_id(&ticket).await?.is_none());
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use eq_session_core::environment::{Clock, IdGenerator};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Duration, IdGenerator, Utc};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Clock that stands still until advanced.
    ///
    /// Clones share the same time, so a test can hand one clone to the
    /// store and keep another to move time forward.
    ///
    /// # Example
    ///
    /// ```
    /// use eq_session_testing::mocks::ManualClock;
    /// use eq_session_core::environment::Clock;
    /// use chrono::Duration;
    ///
    /// let clock = ManualClock::default();
    /// let start = clock.now();
    /// clock.clone().advance(Duration::seconds(301));
    /// assert_eq!(clock.now() - start, Duration::seconds(301));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock reading `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move time forward (or backward, for a negative `by`).
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to `time`.
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }
    }

    impl Default for ManualClock {
        /// A clock reading 2025-01-01 00:00:00 UTC.
        fn default() -> Self {
            Self::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Generator that replays scripted values, then falls back to
    /// sequential ones (`ticket-1`, `ticket-2`, … and `TKN00001`, …).
    ///
    /// Scripting the same value twice forces a collision on the second
    /// issuance.
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedIdGenerator {
        tickets: Arc<Mutex<VecDeque<String>>>,
        tokens: Arc<Mutex<VecDeque<String>>>,
        counter: Arc<AtomicU64>,
        draws: Arc<AtomicU64>,
    }

    impl ScriptedIdGenerator {
        /// Create a generator with nothing scripted.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue tickets to hand out, in order.
        #[must_use]
        pub fn with_tickets<I, S>(self, tickets: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.tickets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(tickets.into_iter().map(Into::into));
            self
        }

        /// Queue tokens to hand out, in order.
        #[must_use]
        pub fn with_tokens<I, S>(self, tokens: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(tokens.into_iter().map(Into::into));
            self
        }

        /// Total number of values drawn so far, tickets and tokens together.
        #[must_use]
        pub fn draws(&self) -> u64 {
            self.draws.load(Ordering::SeqCst)
        }

        fn next(&self, queue: &Mutex<VecDeque<String>>, fallback: impl FnOnce(u64) -> String) -> String {
            self.draws.fetch_add(1, Ordering::SeqCst);
            let scripted = queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
            scripted.unwrap_or_else(|| fallback(self.counter.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    impl IdGenerator for ScriptedIdGenerator {
        fn ticket(&self) -> String {
            self.next(&self.tickets, |n| format!("ticket-{n}"))
        }

        fn token(&self) -> String {
            self.next(&self.tokens, |n| format!("TKN{n:05}"))
        }
    }
}

/// Store test doubles.
pub mod stores {
    use chrono::{DateTime, Duration, Utc};
    use eq_session_core::{
        InsertOutcome, Result, SessionData, SessionDataStore, SessionError, SessionRecord,
        TicketRecord, TicketStore, TokenRecord, TokenStore,
    };

    /// Store whose every operation fails with [`SessionError::Storage`].
    #[derive(Debug, Clone)]
    pub struct FailingStore {
        message: String,
    }

    impl FailingStore {
        /// Create a store failing with `message`.
        #[must_use]
        pub fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
            }
        }

        fn fail<T>(&self) -> Result<T> {
            Err(SessionError::Storage(self.message.clone()))
        }
    }

    impl Default for FailingStore {
        fn default() -> Self {
            Self::new("store unavailable")
        }
    }

    impl SessionDataStore for FailingStore {
        async fn find_session(&self, _id: &str) -> Result<Option<SessionRecord>> {
            self.fail()
        }

        async fn upsert_session(
            &self,
            _id: &str,
            _data: SessionData,
            _now: DateTime<Utc>,
        ) -> Result<SessionRecord> {
            self.fail()
        }
    }

    impl TicketStore for FailingStore {
        async fn find_ticket(&self, _ticket: &str) -> Result<Option<TicketRecord>> {
            self.fail()
        }

        async fn insert_ticket(&self, _record: &TicketRecord, _ttl: Duration) -> Result<InsertOutcome> {
            self.fail()
        }
    }

    impl TokenStore for FailingStore {
        async fn find_token(&self, _token: &str) -> Result<Option<TokenRecord>> {
            self.fail()
        }

        async fn insert_token(&self, _record: &TokenRecord, _ttl: Duration) -> Result<InsertOutcome> {
            self.fail()
        }

        async fn take_token(&self, _token: &str) -> Result<Option<TokenRecord>> {
            self.fail()
        }
    }
}

/// Install a test-harness-captured `tracing` subscriber.
///
/// Respects `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{ManualClock, ScriptedIdGenerator};
pub use stores::FailingStore;
