//! Series load errors.
//!
//! These never reach the request caller: the loader logs them and
//! substitutes an empty series.

use std::path::PathBuf;

use greeks_core::types::DateError;
use thiserror::Error;

/// Failure reading a backing file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened or stat'ed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV or a missing/mistyped column.
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// A `datetime` cell that no supported format accepts.
    #[error("Bad timestamp in {} row {row}: {source}", path.display())]
    Timestamp {
        /// Offending file
        path: PathBuf,
        /// 1-based data row
        row: usize,
        /// Underlying error
        #[source]
        source: DateError,
    },

    /// A `type` cell that is neither call nor put.
    #[error("Bad option type in {} row {row}: {value:?}", path.display())]
    OptionType {
        /// Offending file
        path: PathBuf,
        /// 1-based data row
        row: usize,
        /// The raw cell
        value: String,
    },
}
