//! Typed async client for the sensor-hub readings backend.
//!
//! Two pieces do the real work:
//! - [`SessionClient`]: bearer-token session handling, endpoint
//!   construction, and a single dispatch path that classifies failures
//!   and fires the unauthorized callback on any 401.
//! - [`aggregate::summarize`]: pure per-sensor aggregation of readings
//!   into dashboard summaries (latest / average / min / max).
//!
//! The CLI binary in `main.rs` is the reference consumer.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;

pub use client::{SessionClient, SessionClientBuilder, DEFAULT_BASE_URL};
pub use config::ClientConfig;
pub use domain::{AuthToken, SensorReading, SensorReadingCreate, SensorSummary};
pub use error::ApiError;
