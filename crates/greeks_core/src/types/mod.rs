//! Core option, time and error types.
//!
//! This module provides:
//! - `option_type`: Call/put classification with lenient parsing of file conventions
//! - `time`: Timestamp parsing, ISO normalisation and ACT/365 time-to-expiry
//! - `error`: Structured error types for solvers, analytics and date handling
//!
//! # Re-exports
//!
//! For convenience, commonly used items are re-exported at this module level.

pub mod error;
pub mod option_type;
pub mod time;

pub use error::{AnalyticalError, DateError, SolverError};
pub use option_type::OptionType;
pub use time::{
    expiry_datetime, format_timestamp, parse_expiry, parse_timestamp, time_to_expiry,
    SECONDS_PER_YEAR,
};
