//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (request_id, method, path, status) on every event
//! - Request ID flows from the transport into the dispatcher
//! - Metrics are cheap (atomic increments) and recorded even with no exporter

pub mod logging;
pub mod metrics;
