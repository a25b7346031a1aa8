//! Closed-form option analytics.
//!
//! - [`BlackScholes`]: prices and sensitivities for European options
//! - [`GreeksFormula`]: pluggable Greeks evaluation, [`BlackScholesGreeks`] by default
//! - [`ImpliedVolSolver`]: pluggable implied volatility, [`BlackScholesIvSolver`] by default

mod black_scholes;
mod greeks;
mod implied_vol;

pub use black_scholes::BlackScholes;
pub use greeks::{BlackScholesGreeks, GreeksFormula, GreeksInput};
pub use implied_vol::{
    BlackScholesIvSolver, ImpliedVolSolver, OptionQuote, MAX_VOLATILITY, MIN_VOLATILITY,
};
