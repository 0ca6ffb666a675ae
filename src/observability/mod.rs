//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, one span per mint attempt)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Attempt IDs (UUID v4) flow through every event of one mint attempt
//! - Metrics are cheap (atomic increments) and no-ops without an exporter
//! - Secrets never reach either sink

pub mod logging;
pub mod metrics;
