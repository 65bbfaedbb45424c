//! ==============================================================================
//! aggregate.rs - per-sensor dashboard summaries
//! ==============================================================================
//!
//! purpose:
//!     pure transformation from a flat reading list into one summary per
//!     sensor: chronological history plus latest / average / min / max.
//!     no io, no caching - the dashboard recomputes on every refresh,
//!     reading volumes are small.
//!
//! relationships:
//!     - input: domain::SensorReading (usually fresh from client.rs)
//!     - output: domain::SensorSummary, consumed by the dashboard layer
//!
//! ==============================================================================

use std::collections::BTreeMap;

use crate::domain::{SensorReading, SensorSummary};

/// Group readings by sensor and derive display statistics.
///
/// Each group is stable-sorted ascending by timestamp (ties keep input
/// order), and the result is ordered ascending by sensor id. A reading
/// with no value counts as `0` in average/min/max, matching the backend
/// dashboard's fallback for failed samples.
pub fn summarize(readings: Vec<SensorReading>) -> Vec<SensorSummary> {
    // BTreeMap gives the sensor-id ordering of the output for free
    let mut groups: BTreeMap<String, Vec<SensorReading>> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(reading.sensor_id.clone())
            .or_default()
            .push(reading);
    }

    groups
        .into_iter()
        .map(|(sensor_id, mut group)| {
            group.sort_by_key(|r| r.timestamp);
            let stats = Stats::of(&group);
            SensorSummary {
                sensor_id,
                latest: group.last().cloned(),
                average: stats.map(|s| s.average),
                min: stats.map(|s| s.min),
                max: stats.map(|s| s.max),
                readings: group,
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
struct Stats {
    average: f64,
    min: f64,
    max: f64,
}

impl Stats {
    fn of(sorted: &[SensorReading]) -> Option<Stats> {
        if sorted.is_empty() {
            return None;
        }

        // missing value counts as 0, for the mean and the extrema alike
        let values: Vec<f64> = sorted.iter().map(|r| r.value.unwrap_or(0.0)).collect();
        let sum: f64 = values.iter().sum();

        Some(Stats {
            average: sum / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}
