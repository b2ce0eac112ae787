//! # Geoform Client
//!
//! Typed Rust client for the remote geo service backing the cascading
//! location form: a time-boxed response cache, a latency metrics
//! recorder with observer notification, the HTTP gateway, and the
//! country → state → district selection controller.
//!
//! ## Wiring
//!
//! The cache and the metrics recorder are ordinary values constructed
//! once at process start and shared by handle — there are no global
//! singletons:
//!
//! ```no_run
//! use geoform_client::cache::TimedCache;
//! use geoform_client::client::GeoClient;
//! use geoform_client::config::GeoServiceConfig;
//! use geoform_client::metrics::MetricsRecorder;
//! use geoform_client::selection::SelectionController;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), geoform_client::error::GeoApiError> {
//! let cache = Arc::new(TimedCache::default());
//! let metrics = Arc::new(MetricsRecorder::new());
//! let client = GeoClient::new(
//!     GeoServiceConfig::from_env(),
//!     Arc::clone(&cache),
//!     Arc::clone(&metrics),
//! )?;
//! let controller = Arc::new(SelectionController::new(client, metrics));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod selection;

pub use cache::TimedCache;
pub use client::{CachedGeo, GeoClient};
pub use config::GeoServiceConfig;
pub use error::GeoApiError;
pub use metrics::{MetricCategory, MetricSample, MetricsRecorder};
pub use selection::{FormSubmission, SelectionController, SelectionState};
