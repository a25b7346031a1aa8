//! Series loading with mtime-keyed caching.
//!
//! A spot series is cached under `spot_<mtime>`; an option series under
//! `option_<mtime>_<expiry>_<strike>_<type>`, since one file may hold several
//! contracts and the cached subset is per contract. Editing (or merely
//! touching) a file changes its mtime and therefore its key. Stale keys are
//! never deleted; they expire by TTL.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use infra_store::{CacheStore, CacheStoreExt};

use crate::error::LoadError;
use crate::model::{InstrumentDescriptor, OptionBar, SpotBar};
use crate::source::SeriesSource;

/// Loads spot and option series through the cache.
///
/// Load failures are logged and reported as an empty series.
#[derive(Clone)]
pub struct SeriesLoader {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn SeriesSource>,
    ttl: Duration,
}

impl SeriesLoader {
    /// Loader over `source`, caching into `store` for `ttl`.
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn SeriesSource>, ttl: Duration) -> Self {
        Self { store, source, ttl }
    }

    /// Cache key of the spot series at `path`.
    pub fn spot_key(&self, path: &Path) -> Result<String, LoadError> {
        let mtime = self.mtime(path)?;
        Ok(format!("spot_{}", format_mtime(mtime)))
    }

    /// Cache key of one instrument's option series.
    pub fn option_key(&self, instrument: &InstrumentDescriptor) -> Result<String, LoadError> {
        let mtime = self.mtime(&instrument.path)?;
        Ok(format!(
            "option_{}_{}_{}_{}",
            format_mtime(mtime),
            instrument.expiry,
            instrument.strike,
            instrument.option_type
        ))
    }

    /// Load the spot series at `path`.
    pub fn load_spot(&self, path: &Path) -> Vec<SpotBar> {
        let key = match self.spot_key(path) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "spot load failed");
                return Vec::new();
            }
        };

        if let Some(cached) = self.store.get_json::<Vec<SpotBar>>(&key) {
            tracing::debug!(key = %key, rows = cached.len(), "spot cache hit");
            return cached;
        }

        tracing::info!(path = %path.display(), "loading spot series");
        match self.source.read_spot(path) {
            Ok(bars) => {
                self.store_series(&key, &bars);
                bars
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "spot load failed");
                Vec::new()
            }
        }
    }

    /// Load the rows of one instrument, filtered by strike and type.
    pub fn load_option(&self, instrument: &InstrumentDescriptor) -> Vec<OptionBar> {
        let path = instrument.path.as_path();
        let key = match self.option_key(instrument) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "option load failed");
                return Vec::new();
            }
        };

        if let Some(cached) = self.store.get_json::<Vec<OptionBar>>(&key) {
            tracing::debug!(key = %key, rows = cached.len(), "option cache hit");
            return cached;
        }

        tracing::info!(path = %path.display(), "loading option series");
        match self.source.read_options(path) {
            Ok(bars) => {
                let bars: Vec<OptionBar> = bars
                    .into_iter()
                    .filter(|bar| instrument.matches(bar))
                    .collect();
                self.store_series(&key, &bars);
                bars
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "option load failed");
                Vec::new()
            }
        }
    }

    fn mtime(&self, path: &Path) -> Result<SystemTime, LoadError> {
        self.source.modified(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn store_series<T: serde::Serialize>(&self, key: &str, series: &[T]) {
        if let Err(e) = self.store.set_json(key, series, self.ttl) {
            tracing::warn!(key, error = %e, "series not cached");
        }
    }
}

impl std::fmt::Debug for SeriesLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesLoader").field("ttl", &self.ttl).finish()
    }
}

/// `<seconds>.<nanoseconds>` since the Unix epoch, negative before it.
fn format_mtime(mtime: SystemTime) -> String {
    match mtime.duration_since(UNIX_EPOCH) {
        Ok(d) => format!("{}.{:09}", d.as_secs(), d.subsec_nanos()),
        Err(e) => {
            let d = e.duration();
            format!("-{}.{:09}", d.as_secs(), d.subsec_nanos())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeks_core::types::OptionType;
    use infra_store::MemoryStore;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    use crate::source::CsvSource;

    fn loader() -> SeriesLoader {
        SeriesLoader::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CsvSource),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_format_mtime() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 5);
        assert_eq!(format_mtime(t), "1700000000.000000005");
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(format_mtime(before), "-1.000000000");
    }

    #[test]
    fn test_option_key_embeds_contract() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NIFTY_2024-06-27_22000_CE.csv");
        fs::write(&path, "datetime,strike,type,close\n").unwrap();

        let descriptor = InstrumentDescriptor {
            path: path.clone(),
            expiry: chrono::NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            strike: 22000.0,
            option_type: OptionType::Call,
        };
        let key = loader().option_key(&descriptor).unwrap();
        assert!(key.starts_with("option_"));
        assert!(key.ends_with("_2024-06-27_22000_call"));

        let put = InstrumentDescriptor {
            option_type: OptionType::Put,
            ..descriptor
        };
        assert_ne!(loader().option_key(&put).unwrap(), key);
    }

    #[test]
    fn test_option_rows_filtered_to_contract() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NIFTY_2024-06-27_22000_CE.csv");
        fs::write(
            &path,
            "datetime,strike,type,close\n\
             2024-06-26 09:15:00,22000,CE,100\n\
             2024-06-26 09:15:00,22000,PE,90\n\
             2024-06-26 09:15:00,22100,CE,60\n\
             2024-06-26 10:15:00,22000,CE,105\n",
        )
        .unwrap();

        let descriptor = InstrumentDescriptor {
            path,
            expiry: chrono::NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            strike: 22000.0,
            option_type: OptionType::Call,
        };
        let bars = loader().load_option(&descriptor);
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.option_type == OptionType::Call && b.strike == 22000.0));
    }

    #[test]
    fn test_failures_degrade_to_empty() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("spot.csv");
        fs::write(&broken, "when,price\nx,y\n").unwrap();

        let loader = loader();
        assert!(loader.load_spot(&broken).is_empty());
        assert!(loader.load_spot(&PathBuf::from("/no/such/spot.csv")).is_empty());

        let descriptor = InstrumentDescriptor {
            path: PathBuf::from("/no/such/option.csv"),
            expiry: chrono::NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            strike: 1.0,
            option_type: OptionType::Put,
        };
        assert!(loader.load_option(&descriptor).is_empty());
    }
}
