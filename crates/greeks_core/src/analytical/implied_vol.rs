//! Implied volatility by inverting the Black-Scholes price.
//!
//! Newton-Raphson on vega from a Brenner-Subrahmanyam starting point, with a
//! Brent fallback on a fixed volatility bracket when Newton stalls or leaves
//! the bracket.

use super::black_scholes::BlackScholes;
use super::greeks::is_positive_finite;
use crate::math::solvers::{BrentSolver, NewtonRaphsonSolver, SolverConfig};
use crate::types::{AnalyticalError, OptionType};

/// Lowest volatility searched.
pub const MIN_VOLATILITY: f64 = 1e-4;

/// Highest volatility searched.
pub const MAX_VOLATILITY: f64 = 5.0;

/// Everything needed to back out a volatility from one observed price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionQuote {
    /// Observed option price
    pub price: f64,
    /// Underlying spot at the observation
    pub spot: f64,
    /// Contract strike
    pub strike: f64,
    /// Time to expiry in years
    pub time_to_expiry: f64,
    /// Annualised risk-free rate
    pub rate: f64,
    /// Call or put
    pub option_type: OptionType,
}

/// An implied volatility solver.
pub trait ImpliedVolSolver: Send + Sync {
    /// Solve for the volatility that reproduces `quote.price`.
    ///
    /// # Errors
    /// Domain violations, no-arbitrage violations and non-convergence.
    fn solve(&self, quote: &OptionQuote) -> Result<f64, AnalyticalError>;
}

/// Black-Scholes implied volatility solver.
///
/// # Examples
/// ```
/// use greeks_core::analytical::{BlackScholes, BlackScholesIvSolver, ImpliedVolSolver, OptionQuote};
/// use greeks_core::types::OptionType;
///
/// let bs = BlackScholes::new(100.0_f64, 0.05, 0.3).unwrap();
/// let quote = OptionQuote {
///     price: bs.price(105.0, 0.5, OptionType::Call),
///     spot: 100.0,
///     strike: 105.0,
///     time_to_expiry: 0.5,
///     rate: 0.05,
///     option_type: OptionType::Call,
/// };
/// let iv = BlackScholesIvSolver::default().solve(&quote).unwrap();
/// assert!((iv - 0.3).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct BlackScholesIvSolver {
    newton: NewtonRaphsonSolver<f64>,
    brent: BrentSolver<f64>,
}

impl Default for BlackScholesIvSolver {
    fn default() -> Self {
        Self::new(SolverConfig::new(1e-8, 100))
    }
}

impl BlackScholesIvSolver {
    /// Create a solver; both stages share `config`.
    pub fn new(config: SolverConfig<f64>) -> Self {
        Self {
            newton: NewtonRaphsonSolver::new(config),
            brent: BrentSolver::new(config),
        }
    }

    fn validate(quote: &OptionQuote) -> Result<(), AnalyticalError> {
        if !is_positive_finite(quote.price) {
            return Err(AnalyticalError::InvalidPrice { price: quote.price });
        }
        if !is_positive_finite(quote.spot) {
            return Err(AnalyticalError::InvalidSpot { spot: quote.spot });
        }
        if !is_positive_finite(quote.strike) {
            return Err(AnalyticalError::InvalidStrike {
                strike: quote.strike,
            });
        }
        if !is_positive_finite(quote.time_to_expiry) {
            return Err(AnalyticalError::InvalidExpiry {
                expiry: quote.time_to_expiry,
            });
        }
        if !quote.rate.is_finite() {
            return Err(AnalyticalError::NumericalInstability {
                message: format!("non-finite rate {}", quote.rate),
            });
        }

        let discounted_strike = quote.strike * (-quote.rate * quote.time_to_expiry).exp();
        let (lower, upper) = match quote.option_type {
            OptionType::Call => ((quote.spot - discounted_strike).max(0.0), quote.spot),
            OptionType::Put => ((discounted_strike - quote.spot).max(0.0), discounted_strike),
        };
        if quote.price < lower || quote.price >= upper {
            return Err(AnalyticalError::ArbitrageViolation {
                price: quote.price,
                lower,
                upper,
            });
        }
        Ok(())
    }

    /// Brenner-Subrahmanyam: σ ≈ √(2π/T) · C/S, kept inside a sane range.
    fn initial_guess(quote: &OptionQuote) -> f64 {
        let guess = (2.0 * std::f64::consts::PI / quote.time_to_expiry).sqrt() * quote.price
            / quote.spot;
        guess.clamp(0.01, 3.0)
    }
}

impl ImpliedVolSolver for BlackScholesIvSolver {
    fn solve(&self, quote: &OptionQuote) -> Result<f64, AnalyticalError> {
        Self::validate(quote)?;

        let OptionQuote {
            price,
            spot,
            strike,
            time_to_expiry: t,
            rate,
            option_type,
        } = *quote;

        let model = |sigma: f64| BlackScholes::new(spot, rate, sigma);
        let objective = |sigma: f64| {
            model(sigma)
                .map(|bs| bs.price(strike, t, option_type) - price)
                .unwrap_or(f64::NAN)
        };
        let vega = |sigma: f64| model(sigma).map(|bs| bs.vega(strike, t)).unwrap_or(0.0);

        let newton = self.newton.find_root_bounded(
            objective,
            vega,
            Self::initial_guess(quote),
            MIN_VOLATILITY,
            MAX_VOLATILITY,
        );

        match newton {
            Ok(sigma) => Ok(sigma),
            Err(_) => Ok(self
                .brent
                .find_root(objective, MIN_VOLATILITY, MAX_VOLATILITY)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SolverError;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn quote_for(sigma: f64, strike: f64, t: f64, option_type: OptionType) -> OptionQuote {
        let bs = BlackScholes::new(100.0, 0.05, sigma).unwrap();
        OptionQuote {
            price: bs.price(strike, t, option_type),
            spot: 100.0,
            strike,
            time_to_expiry: t,
            rate: 0.05,
            option_type,
        }
    }

    #[test]
    fn test_recovers_volatility_across_strikes() {
        let solver = BlackScholesIvSolver::default();
        for strike in [90.0, 100.0, 110.0] {
            for option_type in [OptionType::Call, OptionType::Put] {
                let quote = quote_for(0.25, strike, 0.5, option_type);
                let iv = solver.solve(&quote).unwrap();
                assert_relative_eq!(iv, 0.25, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_recovers_high_volatility() {
        let solver = BlackScholesIvSolver::default();
        let quote = quote_for(1.8, 100.0, 0.1, OptionType::Call);
        assert_relative_eq!(solver.solve(&quote).unwrap(), 1.8, epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let solver = BlackScholesIvSolver::default();
        let mut quote = quote_for(0.2, 100.0, 0.5, OptionType::Call);
        quote.price = 0.0;
        assert!(matches!(
            solver.solve(&quote),
            Err(AnalyticalError::InvalidPrice { .. })
        ));

        let mut quote = quote_for(0.2, 100.0, 0.5, OptionType::Call);
        quote.spot = -1.0;
        assert!(matches!(
            solver.solve(&quote),
            Err(AnalyticalError::InvalidSpot { .. })
        ));

        let mut quote = quote_for(0.2, 100.0, 0.5, OptionType::Call);
        quote.time_to_expiry = 0.0;
        assert!(matches!(
            solver.solve(&quote),
            Err(AnalyticalError::InvalidExpiry { .. })
        ));
    }

    #[test]
    fn test_rejects_price_below_intrinsic() {
        let solver = BlackScholesIvSolver::default();
        let mut quote = quote_for(0.2, 80.0, 0.5, OptionType::Call);
        quote.price = 5.0; // intrinsic is above 20
        assert!(matches!(
            solver.solve(&quote),
            Err(AnalyticalError::ArbitrageViolation { .. })
        ));
    }

    #[test]
    fn test_rejects_call_above_spot() {
        let solver = BlackScholesIvSolver::default();
        let mut quote = quote_for(0.2, 100.0, 0.5, OptionType::Call);
        quote.price = 150.0;
        assert!(matches!(
            solver.solve(&quote),
            Err(AnalyticalError::ArbitrageViolation { .. })
        ));
    }

    #[test]
    fn test_unreachable_volatility_is_solver_error() {
        // Price implied by σ far above the searched bracket
        let solver = BlackScholesIvSolver::default();
        let quote = quote_for(8.0, 100.0, 1.0, OptionType::Call);
        match solver.solve(&quote) {
            Err(AnalyticalError::Solver(SolverError::NoBracket { .. })) => {}
            other => panic!("Expected NoBracket, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip_recovers_sigma(
            sigma in 0.1_f64..1.5,
            strike in 90.0_f64..110.0,
            t in 0.1_f64..2.0,
            is_call in any::<bool>(),
        ) {
            let option_type = if is_call { OptionType::Call } else { OptionType::Put };
            let quote = quote_for(sigma, strike, t, option_type);
            prop_assume!(quote.price > 1e-6);
            let iv = BlackScholesIvSolver::default().solve(&quote).unwrap();
            prop_assert!((iv - sigma).abs() < 1e-5, "iv {} vs sigma {}", iv, sigma);
        }
    }
}
