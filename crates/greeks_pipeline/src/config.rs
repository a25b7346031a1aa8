//! Pipeline tuning knobs.

use std::time::Duration;

use chrono::TimeDelta;

use crate::params::DEFAULT_TIME_FILTER;

/// Pipeline configuration.
///
/// The default schedule lives here as an explicit value; request
/// normalisation substitutes it when a query names no markers.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// TTL of each cached spot or option series (24 hours)
    pub series_ttl: Duration,
    /// TTL of each cached full result (1 hour)
    pub result_ttl: Duration,
    /// Maximum distance of an asof match, inclusive (1 minute)
    pub asof_tolerance: TimeDelta,
    /// Rate used when the request has none (0.05)
    pub default_rate: f64,
    /// Schedule used when the request names no markers
    pub default_time_filter: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            series_ttl: Duration::from_secs(24 * 3600),
            result_ttl: Duration::from_secs(3600),
            asof_tolerance: TimeDelta::seconds(60),
            default_rate: 0.05,
            default_time_filter: DEFAULT_TIME_FILTER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.series_ttl, Duration::from_secs(86_400));
        assert_eq!(config.result_ttl, Duration::from_secs(3_600));
        assert!(config.result_ttl < config.series_ttl);
        assert_eq!(config.asof_tolerance.num_seconds(), 60);
        assert_eq!(config.default_time_filter.len(), 6);
    }
}
