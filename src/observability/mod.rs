//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request via the trace span
//! - Metric updates are fire-and-forget; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;
