use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// a single reading reported by one sensor
///
/// identity is `id`; `sensor_id` groups readings into a logical stream.
/// immutable once received from the backend.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// server-assigned unique identifier
    pub id: i64,

    /// sensor identifier (e.g. "pressure-line-2")
    pub sensor_id: String,

    /// measured value; the backend may omit it for a failed sample
    #[serde(default)]
    pub value: Option<f64>,

    /// ISO-8601 timestamp, assigned by the server on acceptance
    pub timestamp: DateTime<Utc>,
}

/// payload for submitting a new reading
///
/// the server assigns `id` and `timestamp` and echoes back the full
/// [`SensorReading`].
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadingCreate {
    pub sensor_id: String,
    pub value: f64,
}

/// bearer token returned by `/auth/login` and `/auth/register`
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub token: String,
}

/// per-sensor dashboard summary, derived from a flat reading list
///
/// `readings` is chronological ascending. the four statistics are all
/// `None` when the group is empty so "no data" stays distinguishable
/// from a zero value.
#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorSummary {
    pub sensor_id: String,
    pub readings: Vec<SensorReading>,
    pub latest: Option<SensorReading>,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}
