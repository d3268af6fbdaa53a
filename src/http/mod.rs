//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Client
//!     → server.rs (router, middleware stack)
//!     → handlers.rs (parse, validate, dispatch to proxy / quotation)
//!     → response.rs (passthrough or JSON envelope)
//! ```
//!
//! # Design Decisions
//! - Every request gets an `x-request-id`, echoed on the response
//! - Passthrough responses keep the upstream status and body
//! - Errors never expose internals in production

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, GatewayServer};
