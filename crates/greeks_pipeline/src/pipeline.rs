//! Request coordinator.
//!
//! Full-result caching keyed by the parameter fingerprint sits in front of
//! the per-instrument chain: load → time filter → asof merge → analytics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use infra_store::{derive_key, CacheStore, CacheStoreExt, MemoryStore};

use crate::analytics::GreeksCalculator;
use crate::config::PipelineConfig;
use crate::enumerator::{DirectoryEnumerator, InstrumentEnumerator};
use crate::filter::filter_by_times;
use crate::loader::SeriesLoader;
use crate::merge::{merge_asof_sorted, sort_spot};
use crate::model::{GreeksRow, InstrumentDescriptor, SpotBar};
use crate::params::RequestParams;
use crate::source::{CsvSource, SeriesSource};

/// Prefix of full-result cache keys.
pub const RESULT_KEY_PREFIX: &str = "greeks";

/// The Greeks request pipeline.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct GreeksPipeline {
    store: Arc<dyn CacheStore>,
    loader: SeriesLoader,
    enumerator: Arc<dyn InstrumentEnumerator>,
    calculator: GreeksCalculator,
    spot_path: PathBuf,
    config: PipelineConfig,
}

impl GreeksPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn SeriesSource>,
        enumerator: Arc<dyn InstrumentEnumerator>,
        calculator: GreeksCalculator,
        spot_path: impl Into<PathBuf>,
        config: PipelineConfig,
    ) -> Self {
        let loader = SeriesLoader::new(Arc::clone(&store), source, config.series_ttl);
        Self {
            store,
            loader,
            enumerator,
            calculator,
            spot_path: spot_path.into(),
            config,
        }
    }

    /// CSV files on disk, an in-memory cache and the Black-Scholes analytics.
    pub fn from_paths(
        spot_csv: impl Into<PathBuf>,
        options_dir: impl AsRef<Path>,
        config: PipelineConfig,
    ) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CsvSource),
            Arc::new(DirectoryEnumerator::new(options_dir.as_ref())),
            GreeksCalculator::default(),
            spot_csv,
            config,
        )
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalise a raw query and handle it.
    pub fn handle_query(&self, query: &HashMap<String, String>) -> Vec<GreeksRow> {
        let params = RequestParams::from_query(query, &self.config);
        self.handle(&params)
    }

    /// Serve one request, from cache when possible.
    ///
    /// Never fails: data problems shrink the result, in the limit to empty.
    /// Empty results are not cached.
    pub fn handle(&self, params: &RequestParams) -> Vec<GreeksRow> {
        let key = match derive_key(RESULT_KEY_PREFIX, params) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "result fingerprint failed, bypassing cache");
                None
            }
        };

        if let Some(rows) = key
            .as_deref()
            .and_then(|k| self.store.get_json::<Vec<GreeksRow>>(k))
        {
            tracing::info!(rows = rows.len(), "full result cache hit");
            return rows;
        }

        tracing::info!(rate = params.rate, markers = params.time_filter.len(), "full result cache miss");
        let started = Instant::now();

        let mut spot = self.loader.load_spot(&self.spot_path);
        sort_spot(&mut spot);
        let instruments = self.enumerator.list_instruments();
        let rows = self.process_all(&instruments, &spot, params);

        tracing::info!(
            instruments = instruments.len(),
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "greeks computed"
        );

        match key {
            Some(key) if !rows.is_empty() => {
                if let Err(e) = self.store.set_json(&key, &rows, self.config.result_ttl) {
                    tracing::warn!(error = %e, "result not cached");
                }
            }
            _ => tracing::info!("no greeks produced, result not cached"),
        }

        rows
    }

    #[cfg(not(feature = "parallel"))]
    fn process_all(
        &self,
        instruments: &[InstrumentDescriptor],
        spot: &[SpotBar],
        params: &RequestParams,
    ) -> Vec<GreeksRow> {
        instruments
            .iter()
            .flat_map(|instrument| self.process_instrument(instrument, spot, params))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn process_all(
        &self,
        instruments: &[InstrumentDescriptor],
        spot: &[SpotBar],
        params: &RequestParams,
    ) -> Vec<GreeksRow> {
        use rayon::prelude::*;

        let per_instrument: Vec<Vec<GreeksRow>> = instruments
            .par_iter()
            .map(|instrument| self.process_instrument(instrument, spot, params))
            .collect();
        per_instrument.into_iter().flatten().collect()
    }

    fn process_instrument(
        &self,
        instrument: &InstrumentDescriptor,
        spot: &[SpotBar],
        params: &RequestParams,
    ) -> Vec<GreeksRow> {
        let path = instrument.path.display();

        let options = self.loader.load_option(instrument);
        if options.is_empty() {
            tracing::debug!(path = %path, "skip: empty option data");
            return Vec::new();
        }

        let filtered = filter_by_times(options, &params.time_filter);
        if filtered.is_empty() {
            tracing::debug!(path = %path, "skip: no rows at requested times");
            return Vec::new();
        }

        let merged = merge_asof_sorted(filtered, spot, self.config.asof_tolerance);
        if merged.is_empty() {
            tracing::debug!(path = %path, "skip: no spot within tolerance");
            return Vec::new();
        }

        self.calculator.compute(&merged, instrument, params)
    }
}

impl std::fmt::Debug for GreeksPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreeksPipeline")
            .field("spot_path", &self.spot_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
