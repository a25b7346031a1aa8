//! Backing store reads.

use std::io;
use std::path::Path;
use std::time::SystemTime;

use greeks_core::types::{parse_timestamp, OptionType};
use serde::Deserialize;

use crate::error::LoadError;
use crate::model::{OptionBar, SpotBar};

/// Raw series reads, keyed by file identity.
pub trait SeriesSource: Send + Sync {
    /// Last modification time of the backing file.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Read every spot row.
    ///
    /// # Errors
    /// Any unreadable file or unparseable row fails the whole read.
    fn read_spot(&self, path: &Path) -> Result<Vec<SpotBar>, LoadError>;

    /// Read every option row, whatever contract it belongs to.
    ///
    /// # Errors
    /// Any unreadable file or unparseable row fails the whole read.
    fn read_options(&self, path: &Path) -> Result<Vec<OptionBar>, LoadError>;
}

#[derive(Debug, Deserialize)]
struct SpotRecord {
    datetime: String,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct OptionRecord {
    datetime: String,
    strike: f64,
    #[serde(rename = "type")]
    option_type: String,
    close: f64,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    oi: Option<f64>,
}

/// CSV files with a header row. Unknown columns are ignored.
///
/// Spot files need `datetime` and `close`; option files need `datetime`,
/// `strike`, `type` and `close` and may carry `open`, `high`, `low`,
/// `volume` and `oi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSource;

impl CsvSource {
    fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, LoadError> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })
    }

    fn timestamp(path: &Path, row: usize, raw: &str) -> Result<chrono::NaiveDateTime, LoadError> {
        parse_timestamp(raw).map_err(|source| LoadError::Timestamp {
            path: path.to_path_buf(),
            row,
            source,
        })
    }
}

impl SeriesSource for CsvSource {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read_spot(&self, path: &Path) -> Result<Vec<SpotBar>, LoadError> {
        let mut reader = Self::reader(path)?;
        reader
            .deserialize::<SpotRecord>()
            .enumerate()
            .map(|(i, record)| {
                let record = record.map_err(|source| LoadError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(SpotBar {
                    datetime: Self::timestamp(path, i + 1, &record.datetime)?,
                    close: record.close,
                })
            })
            .collect()
    }

    fn read_options(&self, path: &Path) -> Result<Vec<OptionBar>, LoadError> {
        let mut reader = Self::reader(path)?;
        reader
            .deserialize::<OptionRecord>()
            .enumerate()
            .map(|(i, record)| {
                let record = record.map_err(|source| LoadError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
                let option_type: OptionType =
                    record.option_type.parse().map_err(|_| LoadError::OptionType {
                        path: path.to_path_buf(),
                        row: i + 1,
                        value: record.option_type.clone(),
                    })?;
                Ok(OptionBar {
                    datetime: Self::timestamp(path, i + 1, &record.datetime)?,
                    strike: record.strike,
                    option_type,
                    close: record.close,
                    open: record.open,
                    high: record.high,
                    low: record.low,
                    volume: record.volume,
                    oi: record.oi,
                })
            })
            .collect()
    }
}
