//! Row-wise implied volatility and Greeks.

use std::sync::Arc;

use greeks_core::analytical::{
    BlackScholesGreeks, BlackScholesIvSolver, GreeksFormula, GreeksInput, ImpliedVolSolver,
    OptionQuote,
};
use greeks_core::types::{format_timestamp, time_to_expiry, AnalyticalError};

use crate::model::{AlignedObservation, GreeksRow, InstrumentDescriptor};
use crate::params::RequestParams;

/// Runs the solver and formula over aligned observations.
///
/// Observations at or past expiry midnight are skipped. A row whose solve or
/// formula fails is logged and dropped; the rest of the batch proceeds.
#[derive(Clone)]
pub struct GreeksCalculator {
    solver: Arc<dyn ImpliedVolSolver>,
    formula: Arc<dyn GreeksFormula>,
}

impl Default for GreeksCalculator {
    fn default() -> Self {
        Self::new(
            Arc::new(BlackScholesIvSolver::default()),
            Arc::new(BlackScholesGreeks),
        )
    }
}

impl GreeksCalculator {
    /// Calculator over the given solver and formula.
    pub fn new(solver: Arc<dyn ImpliedVolSolver>, formula: Arc<dyn GreeksFormula>) -> Self {
        Self { solver, formula }
    }

    /// Compute result rows for one instrument.
    pub fn compute(
        &self,
        aligned: &[AlignedObservation],
        instrument: &InstrumentDescriptor,
        params: &RequestParams,
    ) -> Vec<GreeksRow> {
        aligned
            .iter()
            .filter_map(|obs| {
                let t = time_to_expiry(instrument.expiry, obs.option.datetime);
                (t > 0.0).then_some((obs, t))
            })
            .filter_map(|(obs, t)| match self.compute_row(obs, t, instrument, params) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::debug!(
                        path = %instrument.path.display(),
                        datetime = %obs.option.datetime,
                        error = %e,
                        "row skipped"
                    );
                    None
                }
            })
            .collect()
    }

    fn compute_row(
        &self,
        obs: &AlignedObservation,
        t: f64,
        instrument: &InstrumentDescriptor,
        params: &RequestParams,
    ) -> Result<GreeksRow, AnalyticalError> {
        let iv = self.solver.solve(&OptionQuote {
            price: obs.option.close,
            spot: obs.close_spot,
            strike: instrument.strike,
            time_to_expiry: t,
            rate: params.rate,
            option_type: instrument.option_type,
        })?;

        let greeks = self.formula.compute(&GreeksInput {
            spot: obs.close_spot,
            strike: instrument.strike,
            time_to_expiry: t,
            rate: params.rate,
            volatility: iv,
            option_type: instrument.option_type,
        })?;

        Ok(GreeksRow {
            datetime: format_timestamp(&obs.option.datetime),
            expiry: instrument.expiry,
            strike: instrument.strike,
            option_type: instrument.option_type,
            iv,
            greeks,
        })
    }
}

impl std::fmt::Debug for GreeksCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreeksCalculator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::model::OptionBar;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use greeks_core::analytical::BlackScholes;
    use greeks_core::types::OptionType;
    use std::path::PathBuf;

    fn instrument() -> InstrumentDescriptor {
        InstrumentDescriptor {
            path: PathBuf::from("NIFTY_2024-06-27_22000_CE.csv"),
            expiry: NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            strike: 22000.0,
            option_type: OptionType::Call,
        }
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// A priced observation consistent with σ = `sigma`.
    fn observation(datetime: NaiveDateTime, spot: f64, sigma: f64) -> AlignedObservation {
        let inst = instrument();
        let t = time_to_expiry(inst.expiry, datetime);
        let price = BlackScholes::new(spot, 0.05, sigma)
            .unwrap()
            .price(inst.strike, t, inst.option_type);
        AlignedObservation {
            option: OptionBar::new(datetime, inst.strike, inst.option_type, price),
            close_spot: spot,
            datetime_spot: datetime,
        }
    }

    fn params() -> RequestParams {
        RequestParams::new(0.05, ["09:15"], &PipelineConfig::default())
    }

    #[test]
    fn test_recovers_volatility_and_tags_rows() {
        let aligned = vec![
            observation(at(26, 9, 15), 22000.0, 0.15),
            observation(at(26, 10, 15), 22050.0, 0.18),
        ];
        let rows = GreeksCalculator::default().compute(&aligned, &instrument(), &params());
        assert_eq!(rows.len(), 2);
        assert_relative_eq!(rows[0].iv, 0.15, epsilon = 1e-5);
        assert_relative_eq!(rows[1].iv, 0.18, epsilon = 1e-5);
        assert_eq!(rows[0].datetime, "2024-06-26T09:15:00");
        assert_eq!(rows[0].strike, 22000.0);
        assert_eq!(rows[0].option_type, OptionType::Call);
        assert!(rows[0].greeks.contains_key("delta"));
    }

    #[test]
    fn test_expired_rows_skipped() {
        let mut late = observation(at(26, 9, 15), 22000.0, 0.15);
        late.option.datetime = at(27, 9, 15);
        let aligned = vec![observation(at(26, 9, 15), 22000.0, 0.15), late];
        let rows = GreeksCalculator::default().compute(&aligned, &instrument(), &params());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_bad_price_row_skipped() {
        let mut bad = observation(at(26, 10, 15), 22000.0, 0.15);
        bad.option.close = -1.0;
        let aligned = vec![observation(at(26, 9, 15), 22000.0, 0.15), bad];
        let rows = GreeksCalculator::default().compute(&aligned, &instrument(), &params());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].datetime, "2024-06-26T09:15:00");
    }

    #[test]
    fn test_empty_input() {
        let rows = GreeksCalculator::default().compute(&[], &instrument(), &params());
        assert!(rows.is_empty());
    }
}
