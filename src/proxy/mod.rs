//! Request forwarding over the shared session.
//!
//! # Data Flow
//! ```text
//! handler
//!     → request.rs (ProxyRequest: method + relative path + optional body, validated)
//!     → forwarder.rs (ensure session → call → on 401 re-authenticate once → call)
//!     → composite.rs (sequential multi-step operations over the forwarder)
//! ```

pub mod composite;
pub mod forwarder;
pub mod request;

pub use composite::{Composite, CompositeResult};
pub use forwarder::{Forward, Forwarder};
pub use request::ProxyRequest;
