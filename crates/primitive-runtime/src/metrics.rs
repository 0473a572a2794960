// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stream execution metrics.
//!
//! [`StreamMetrics`] collects per-primitive and aggregate timing for the
//! primitives a stream has executed. Metrics accumulate across repeated
//! join points on the same stream.

use std::time::Duration;

/// Timing for a single executed primitive.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PrimitiveMetrics {
    /// Implementation name of the primitive.
    pub name: String,
    /// Wall-clock execution time.
    pub duration: Duration,
}

/// Aggregate metrics for a stream.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StreamMetrics {
    /// Total wall-clock time spent inside join points.
    pub total_duration: Duration,
    /// Per-primitive metrics, in execution order.
    pub primitive_metrics: Vec<PrimitiveMetrics>,
}

impl StreamMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed primitive.
    pub fn record(&mut self, name: &str, duration: Duration) {
        self.primitive_metrics.push(PrimitiveMetrics {
            name: name.to_string(),
            duration,
        });
    }

    /// Adds the wall-clock time of one join point.
    pub fn finalise(&mut self, elapsed: Duration) {
        self.total_duration += elapsed;
    }

    /// Returns the number of primitives executed so far.
    pub fn executed(&self) -> usize {
        self.primitive_metrics.len()
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let slowest = self
            .primitive_metrics
            .iter()
            .max_by_key(|m| m.duration)
            .map(|m| format!(", slowest '{}' {:.2}ms", m.name, m.duration.as_secs_f64() * 1000.0))
            .unwrap_or_default();
        format!(
            "Stream: {:.2}ms total, {} primitives{slowest}",
            self.total_duration.as_secs_f64() * 1000.0,
            self.executed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let m = StreamMetrics::new();
        assert_eq!(m.executed(), 0);
        assert!(m.summary().contains("0 primitives"));
    }

    #[test]
    fn test_record_and_finalise() {
        let mut m = StreamMetrics::new();
        m.record("conv", Duration::from_millis(4));
        m.record("ip", Duration::from_millis(9));
        m.finalise(Duration::from_millis(14));
        m.finalise(Duration::from_millis(6));

        assert_eq!(m.executed(), 2);
        assert_eq!(m.total_duration, Duration::from_millis(20));
        assert!(m.summary().contains("slowest 'ip'"));
    }
}
