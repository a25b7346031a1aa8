//! Instrument discovery.

use std::path::{Path, PathBuf};

use greeks_core::types::{parse_expiry, OptionType};

use crate::model::InstrumentDescriptor;

/// Supplies the instrument universe for a request.
pub trait InstrumentEnumerator: Send + Sync {
    /// Every instrument to process, in processing order.
    fn list_instruments(&self) -> Vec<InstrumentDescriptor>;
}

/// Scans one directory (non-recursive) for option files named
/// `<anything>_<YYYY-MM-DD>_<strike>_<type>.csv`.
///
/// `type` accepts the same spellings as [`OptionType`]'s parser. Other
/// files are ignored. A missing directory yields an empty universe.
///
/// # Examples
/// ```
/// use greeks_pipeline::DirectoryEnumerator;
///
/// let parsed = DirectoryEnumerator::parse_file_name("NIFTY_2024-06-27_22000_CE.csv".as_ref());
/// let (expiry, strike, option_type) = parsed.unwrap();
/// assert_eq!(expiry.to_string(), "2024-06-27");
/// assert_eq!(strike, 22000.0);
/// assert!(option_type.is_call());
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryEnumerator {
    dir: PathBuf,
}

impl DirectoryEnumerator {
    /// Enumerate `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The scanned directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extract `(expiry, strike, type)` from a file name, if it follows the
    /// naming convention.
    pub fn parse_file_name(path: &Path) -> Option<(chrono::NaiveDate, f64, OptionType)> {
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let mut parts = stem.rsplitn(4, '_');
        let option_type: OptionType = parts.next()?.parse().ok()?;
        let strike: f64 = parts.next()?.parse().ok()?;
        let expiry = parse_expiry(parts.next()?).ok()?;
        if !(strike.is_finite() && strike > 0.0) {
            return None;
        }
        Some((expiry, strike, option_type))
    }
}

impl InstrumentEnumerator for DirectoryEnumerator {
    fn list_instruments(&self) -> Vec<InstrumentDescriptor> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "options directory unreadable");
                return Vec::new();
            }
        };

        let mut instruments: Vec<InstrumentDescriptor> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| match Self::parse_file_name(&path) {
                Some((expiry, strike, option_type)) => Some(InstrumentDescriptor {
                    path,
                    expiry,
                    strike,
                    option_type,
                }),
                None => {
                    tracing::debug!(path = %path.display(), "ignoring file outside naming convention");
                    None
                }
            })
            .collect();

        instruments.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(dir = %self.dir.display(), count = instruments.len(), "instruments listed");
        instruments
    }
}

/// A fixed universe.
#[derive(Debug, Clone, Default)]
pub struct StaticEnumerator {
    instruments: Vec<InstrumentDescriptor>,
}

impl StaticEnumerator {
    /// Serve `instruments` as given.
    pub fn new(instruments: Vec<InstrumentDescriptor>) -> Self {
        Self { instruments }
    }
}

impl InstrumentEnumerator for StaticEnumerator {
    fn list_instruments(&self) -> Vec<InstrumentDescriptor> {
        self.instruments.clone()
    }
}
