//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Transfer loop produces:
//!     → logging.rs (structured log events, run and iteration spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
