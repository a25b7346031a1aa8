//! Data model shared by every pipeline stage.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use greeks_core::types::OptionType;
use serde::{Deserialize, Serialize};

/// Anything carrying an observation timestamp.
pub trait Timestamped {
    /// Timezone-naive local clock time of the observation.
    fn timestamp(&self) -> NaiveDateTime;
}

/// One spot observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotBar {
    /// Observation time
    pub datetime: NaiveDateTime,
    /// Closing spot price
    pub close: f64,
}

/// One option observation. A single file may interleave several contracts,
/// so each row carries its own strike and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionBar {
    /// Observation time
    pub datetime: NaiveDateTime,
    /// Contract strike
    pub strike: f64,
    /// Call or put
    #[serde(rename = "type")]
    pub option_type: OptionType,
    /// Closing option price
    pub close: f64,
    /// Opening option price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    /// Period high
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// Period low
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    /// Traded volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Open interest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oi: Option<f64>,
}

impl OptionBar {
    /// A bar with only the required fields set.
    pub fn new(datetime: NaiveDateTime, strike: f64, option_type: OptionType, close: f64) -> Self {
        Self {
            datetime,
            strike,
            option_type,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
            oi: None,
        }
    }
}

impl Timestamped for SpotBar {
    fn timestamp(&self) -> NaiveDateTime {
        self.datetime
    }
}

impl Timestamped for OptionBar {
    fn timestamp(&self) -> NaiveDateTime {
        self.datetime
    }
}

/// One option contract in the universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDescriptor {
    /// Backing file
    pub path: PathBuf,
    /// Expiry date
    pub expiry: NaiveDate,
    /// Strike
    pub strike: f64,
    /// Call or put
    pub option_type: OptionType,
}

impl InstrumentDescriptor {
    /// True when `bar` belongs to this contract.
    #[inline]
    pub fn matches(&self, bar: &OptionBar) -> bool {
        bar.strike == self.strike && bar.option_type == self.option_type
    }
}

/// An option observation joined with its nearest spot.
///
/// Spot-origin fields carry a `_spot` suffix so they never collide with the
/// option's own columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedObservation {
    /// The option row
    pub option: OptionBar,
    /// Close of the nearest spot row
    pub close_spot: f64,
    /// Timestamp of the nearest spot row
    pub datetime_spot: NaiveDateTime,
}

impl Timestamped for AlignedObservation {
    fn timestamp(&self) -> NaiveDateTime {
        self.option.datetime
    }
}

/// One computed result.
///
/// Serialises flat: `datetime`, `expiry`, `strike`, `type`, `iv` and then
/// every value returned by the Greeks formula under its own name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksRow {
    /// Normalised ISO-8601 observation time
    pub datetime: String,
    /// Instrument expiry
    pub expiry: NaiveDate,
    /// Instrument strike
    pub strike: f64,
    /// Instrument type
    #[serde(rename = "type")]
    pub option_type: OptionType,
    /// Solved implied volatility
    pub iv: f64,
    /// Greeks by name
    #[serde(flatten)]
    pub greeks: BTreeMap<String, f64>,
}
