//! # greeks_pipeline: Greeks Request Pipeline
//!
//! ## Layer 3 (Pipeline) Role
//!
//! greeks_pipeline turns raw spot and option files into Greeks result rows:
//! - Data model: bars, instrument descriptors, aligned observations, result rows (`model`)
//! - Request parameter normalisation and fingerprinting (`params`)
//! - Backing store reads (`source`) and instrument discovery (`enumerator`)
//! - mtime-keyed series caching (`loader`)
//! - Time-of-day filtering (`filter`) and nearest-timestamp alignment (`merge`)
//! - Per-row implied volatility and Greeks with skip-on-failure (`analytics`)
//! - The request coordinator with its full-result cache (`pipeline`)
//!
//! No stage surfaces data errors to its caller: unreadable files degrade to
//! empty series, failing rows are logged and dropped.
//!
//! ## Feature Flags
//!
//! - `parallel`: process instruments on the rayon pool
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use greeks_pipeline::{GreeksPipeline, PipelineConfig};
//!
//! let pipeline = GreeksPipeline::from_paths("data/spot.csv", "data/options", PipelineConfig::default());
//! let rows = pipeline.handle_query(&HashMap::new());
//! println!("{} rows", rows.len());
//! ```

#![warn(missing_docs)]

pub mod analytics;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod model;
pub mod params;
pub mod pipeline;
pub mod source;

pub use analytics::GreeksCalculator;
pub use config::PipelineConfig;
pub use enumerator::{DirectoryEnumerator, InstrumentEnumerator, StaticEnumerator};
pub use error::LoadError;
pub use filter::filter_by_times;
pub use loader::SeriesLoader;
pub use merge::{merge_asof, merge_asof_sorted, sort_spot};
pub use model::{AlignedObservation, GreeksRow, InstrumentDescriptor, OptionBar, SpotBar, Timestamped};
pub use params::{RequestParams, DEFAULT_TIME_FILTER};
pub use pipeline::GreeksPipeline;
pub use source::{CsvSource, SeriesSource};
