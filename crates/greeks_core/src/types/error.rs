//! Error types for structured error handling.
//!
//! This module provides:
//! - `SolverError`: Errors from root-finding solvers
//! - `AnalyticalError`: Domain and convergence errors from Greeks and implied volatility
//! - `DateError`: Errors from timestamp and expiry parsing

use thiserror::Error;

/// Solver errors.
///
/// # Examples
/// ```
/// use greeks_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// Derivative near zero (division by zero risk in Newton-Raphson).
    #[error("Derivative near zero at x = {x}")]
    DerivativeNearZero {
        /// The x value where derivative was near zero
        x: f64,
    },

    /// No valid bracket (function values at endpoints have same sign).
    #[error("No bracket: f({a}) and f({b}) have same sign")]
    NoBracket {
        /// Left bracket endpoint
        a: f64,
        /// Right bracket endpoint
        b: f64,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Analytical pricing errors.
///
/// Raised by the Black-Scholes Greeks formula and the implied volatility
/// solver. Each one is scoped to a single observation.
///
/// # Examples
/// ```
/// use greeks_core::types::AnalyticalError;
///
/// let err = AnalyticalError::InvalidVolatility { volatility: -0.2 };
/// assert!(format!("{}", err).contains("volatility"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalyticalError {
    /// Invalid volatility (non-positive or non-finite).
    #[error("Invalid volatility: σ = {volatility}")]
    InvalidVolatility {
        /// The invalid volatility value
        volatility: f64,
    },

    /// Invalid spot price (non-positive or non-finite).
    #[error("Invalid spot price: S = {spot}")]
    InvalidSpot {
        /// The invalid spot price value
        spot: f64,
    },

    /// Invalid strike (non-positive or non-finite).
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// Invalid time to expiry (non-positive or non-finite).
    #[error("Invalid time to expiry: T = {expiry}")]
    InvalidExpiry {
        /// The invalid time to expiry in years
        expiry: f64,
    },

    /// Invalid option market price (non-positive or non-finite).
    #[error("Invalid option price: {price}")]
    InvalidPrice {
        /// The invalid market price
        price: f64,
    },

    /// Market price outside the no-arbitrage band.
    #[error("Option price {price} outside no-arbitrage bounds [{lower}, {upper}]")]
    ArbitrageViolation {
        /// The market price
        price: f64,
        /// Discounted intrinsic value
        lower: f64,
        /// Upper bound (spot for calls, discounted strike for puts)
        upper: f64,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {message}")]
    NumericalInstability {
        /// Description of the numerical issue
        message: String,
    },

    /// Root solver failure while inverting the pricing formula.
    #[error("Implied volatility solver failed: {0}")]
    Solver(#[from] SolverError),
}

/// Date and timestamp errors.
///
/// # Examples
/// ```
/// use greeks_core::types::DateError;
///
/// let err = DateError::ParseError("not-a-date".to_string());
/// assert_eq!(format!("{}", err), "Date parse error: not-a-date");
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateError {
    /// Failed to parse a timestamp or date string.
    #[error("Date parse error: {0}")]
    ParseError(String),
}
