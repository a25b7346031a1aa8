//! # greeks_core: Numeric Foundation for the Greeks Dashboard
//!
//! ## Layer 1 (Foundation) Role
//!
//! greeks_core is the bottom layer of the workspace, providing:
//! - Option classification: `OptionType` (`types::option_type`)
//! - Timestamp parsing, normalisation and time-to-expiry (`types::time`)
//! - Error types: `SolverError`, `AnalyticalError`, `DateError` (`types::error`)
//! - Standard normal distribution and root solvers (`math`)
//! - Black-Scholes Greeks and implied volatility (`analytical`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other workspace crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: Timestamp arithmetic
//! - serde: Serialisation of `OptionType`
//! - thiserror: Error derivation
//!
//! ## Usage Examples
//!
//! ```rust
//! use greeks_core::analytical::{BlackScholesGreeks, GreeksFormula, GreeksInput};
//! use greeks_core::types::OptionType;
//!
//! let input = GreeksInput {
//!     spot: 100.0,
//!     strike: 100.0,
//!     time_to_expiry: 1.0,
//!     rate: 0.05,
//!     volatility: 0.2,
//!     option_type: OptionType::Call,
//! };
//! let greeks = BlackScholesGreeks.compute(&input).unwrap();
//! assert!(greeks["delta"] > 0.5);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod analytical;
pub mod math;
pub mod types;
