//! Closed-form Greeks as a pluggable formula.

use std::collections::BTreeMap;

use super::black_scholes::BlackScholes;
use crate::types::{AnalyticalError, OptionType};

/// Inputs of a single Greeks evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreeksInput {
    /// Underlying spot price
    pub spot: f64,
    /// Contract strike
    pub strike: f64,
    /// Time to expiry in years
    pub time_to_expiry: f64,
    /// Annualised risk-free rate
    pub rate: f64,
    /// Annualised volatility
    pub volatility: f64,
    /// Call or put
    pub option_type: OptionType,
}

/// A Greeks formula: maps one input to named sensitivities.
///
/// The name set is the formula's choice; result rows carry every entry.
pub trait GreeksFormula: Send + Sync {
    /// Evaluate the formula.
    ///
    /// # Errors
    /// Domain violations (non-positive inputs) and non-finite outputs.
    fn compute(&self, input: &GreeksInput) -> Result<BTreeMap<String, f64>, AnalyticalError>;
}

/// Black-Scholes Greeks.
///
/// Returns `price`, `delta`, `gamma`, `vega` (per unit σ), `theta` (per year)
/// and `rho` (per unit rate).
///
/// # Examples
/// ```
/// use greeks_core::analytical::{BlackScholesGreeks, GreeksFormula, GreeksInput};
/// use greeks_core::types::OptionType;
///
/// let input = GreeksInput {
///     spot: 100.0,
///     strike: 100.0,
///     time_to_expiry: 1.0,
///     rate: 0.05,
///     volatility: 0.2,
///     option_type: OptionType::Put,
/// };
/// let greeks = BlackScholesGreeks.compute(&input).unwrap();
/// assert!(greeks["delta"] < 0.0);
/// assert_eq!(greeks.len(), 6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesGreeks;

impl GreeksFormula for BlackScholesGreeks {
    fn compute(&self, input: &GreeksInput) -> Result<BTreeMap<String, f64>, AnalyticalError> {
        let GreeksInput {
            spot,
            strike,
            time_to_expiry: t,
            rate,
            volatility,
            option_type,
        } = *input;

        if !is_positive_finite(strike) {
            return Err(AnalyticalError::InvalidStrike { strike });
        }
        if !is_positive_finite(t) {
            return Err(AnalyticalError::InvalidExpiry { expiry: t });
        }
        if !rate.is_finite() {
            return Err(AnalyticalError::NumericalInstability {
                message: format!("non-finite rate {rate}"),
            });
        }

        let bs = BlackScholes::new(spot, rate, volatility)?;

        let greeks = BTreeMap::from([
            ("price".to_string(), bs.price(strike, t, option_type)),
            ("delta".to_string(), bs.delta(strike, t, option_type)),
            ("gamma".to_string(), bs.gamma(strike, t)),
            ("vega".to_string(), bs.vega(strike, t)),
            ("theta".to_string(), bs.theta(strike, t, option_type)),
            ("rho".to_string(), bs.rho(strike, t, option_type)),
        ]);

        if let Some((name, value)) = greeks.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalyticalError::NumericalInstability {
                message: format!("{name} evaluated to {value}"),
            });
        }

        Ok(greeks)
    }
}

#[inline]
pub(crate) fn is_positive_finite(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(option_type: OptionType) -> GreeksInput {
        GreeksInput {
            spot: 22_000.0,
            strike: 22_100.0,
            time_to_expiry: 7.0 / 365.0,
            rate: 0.065,
            volatility: 0.14,
            option_type,
        }
    }

    #[test]
    fn test_returns_all_names() {
        let greeks = BlackScholesGreeks.compute(&input(OptionType::Call)).unwrap();
        let names: Vec<&str> = greeks.keys().map(String::as_str).collect();
        assert_eq!(names, ["delta", "gamma", "price", "rho", "theta", "vega"]);
    }

    #[test]
    fn test_gamma_vega_match_across_types() {
        let call = BlackScholesGreeks.compute(&input(OptionType::Call)).unwrap();
        let put = BlackScholesGreeks.compute(&input(OptionType::Put)).unwrap();
        assert_relative_eq!(call["gamma"], put["gamma"], epsilon = 1e-15);
        assert_relative_eq!(call["vega"], put["vega"], epsilon = 1e-12);
        assert_relative_eq!(put["delta"], call["delta"] - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_domain_errors() {
        let mut bad = input(OptionType::Call);
        bad.spot = 0.0;
        assert!(matches!(
            BlackScholesGreeks.compute(&bad),
            Err(AnalyticalError::InvalidSpot { .. })
        ));

        let mut bad = input(OptionType::Call);
        bad.strike = -1.0;
        assert!(matches!(
            BlackScholesGreeks.compute(&bad),
            Err(AnalyticalError::InvalidStrike { .. })
        ));

        let mut bad = input(OptionType::Call);
        bad.time_to_expiry = 0.0;
        assert!(matches!(
            BlackScholesGreeks.compute(&bad),
            Err(AnalyticalError::InvalidExpiry { .. })
        ));

        let mut bad = input(OptionType::Put);
        bad.volatility = f64::NAN;
        assert!(matches!(
            BlackScholesGreeks.compute(&bad),
            Err(AnalyticalError::InvalidVolatility { .. })
        ));
    }
}
