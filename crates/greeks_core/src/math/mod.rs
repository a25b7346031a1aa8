//! Numerical building blocks.
//!
//! - [`distributions`]: standard normal CDF and PDF
//! - [`solvers`]: Newton-Raphson and Brent root finders used by the
//!   implied volatility inversion

pub mod distributions;
pub mod solvers;

pub use distributions::{norm_cdf, norm_pdf};
