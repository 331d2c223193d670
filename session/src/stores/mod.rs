//! Storage implementations.
//!
//! - **Memory** - In-process maps with clock-driven expiry
//! - **Redis** - Native TTL and atomic `SET NX` unique inserts
//! - **PostgreSQL** (feature `postgres`) - Tables with `expires_at` and an explicit purge

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod redis;

// Re-exports
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
pub use redis::RedisStore;
