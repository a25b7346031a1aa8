//! Request parameters.
//!
//! The transport hands over a flat string map. Normalisation never fails:
//! a bad rate falls back to the configured default and an empty marker list
//! falls back to the default schedule.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// Default daily time-of-day schedule.
pub const DEFAULT_TIME_FILTER: [&str; 6] = ["09:15", "10:15", "11:15", "12:15", "13:15", "15:15"];

/// Normalised request parameters.
///
/// Serialises as `{"r": .., "time_filter": [..]}`, the structure hashed into
/// the full-result cache key. Markers are a sorted set, so ordering and
/// duplicates in the query do not change the fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Risk-free rate
    #[serde(rename = "r")]
    pub rate: f64,
    /// `HH:MM` markers
    pub time_filter: BTreeSet<String>,
}

impl RequestParams {
    /// Build from explicit values, applying the same defaults as a query.
    pub fn new<I, S>(rate: f64, markers: I, config: &PipelineConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rate = if rate.is_finite() {
            rate
        } else {
            config.default_rate
        };
        let mut time_filter: BTreeSet<String> = markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if time_filter.is_empty() {
            time_filter = config.default_time_filter.iter().cloned().collect();
        }
        Self { rate, time_filter }
    }

    /// Normalise the raw `r` and `time_filter` query values.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashMap;
    /// use greeks_pipeline::{PipelineConfig, RequestParams};
    ///
    /// let config = PipelineConfig::default();
    /// let query = HashMap::from([
    ///     ("r".to_string(), "abc".to_string()),
    ///     ("time_filter".to_string(), " 10:15, ,09:15".to_string()),
    /// ]);
    /// let params = RequestParams::from_query(&query, &config);
    /// assert_eq!(params.rate, 0.05);
    /// assert_eq!(params.time_filter.len(), 2);
    /// ```
    pub fn from_query(query: &HashMap<String, String>, config: &PipelineConfig) -> Self {
        let rate = query
            .get("r")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(config.default_rate);
        let markers = query
            .get("time_filter")
            .map(|raw| raw.split(',').collect::<Vec<_>>())
            .unwrap_or_default();
        Self::new(rate, markers, config)
    }
}
