//! Shared upstream session.
//!
//! # Data Flow
//! ```text
//! Forwarder
//!     → manager.rs (ensure_session / force_reauthenticate, single-flight login)
//!     → store.rs (SessionStore trait: in-memory slot)
//!     → redis.rs (SessionStore backed by Redis SET EX / GET)
//! ```

pub mod manager;
pub mod redis;
pub mod store;

pub use manager::SessionManager;
pub use self::redis::RedisSessionStore;
pub use store::{MemorySessionStore, SessionStore};
