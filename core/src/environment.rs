//! Environment traits.
//!
//! External effects the session manager depends on (time and randomness)
//! are abstracted behind traits and injected at construction.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability.
///
/// # Examples
///
/// ```
/// use eq_session_core::environment::{Clock, SystemClock};
///
/// let before = chrono::Utc::now();
/// assert!(SystemClock.now() >= before);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random identifier source.
///
/// Draws are independent and carry no uniqueness guarantee: a draw that
/// collides with a live record is detected by the store on insert and the
/// session manager simply draws again.
pub trait IdGenerator: Send + Sync {
    /// Draw a high-entropy ticket.
    fn ticket(&self) -> String;

    /// Draw a short, human-typable token.
    fn token(&self) -> String;
}
