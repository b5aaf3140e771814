pub mod event;
pub mod seir;
pub mod series;
pub mod simulate;
pub mod sir;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_config, Result};

/// Relative tolerance for the initial compartments summing to the population.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// A disjoint subpopulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Infected,
    Recovered,
}

impl Compartment {
    pub fn label(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Exposed => "E",
            Compartment::Infected => "I",
            Compartment::Recovered => "R",
        }
    }
}

/// Parameters shared by every model variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub population: f64,
    /// Horizon in whole days; a run yields one column per day `0..days`.
    pub days: u32,
    /// Base contact rate (beta, per day)
    pub contact_rate: f64,
    /// 1 / mean infectious period (gamma, per day)
    pub recovery_rate: f64,
}

impl ModelParams {
    pub fn check(&self) -> Result<()> {
        ensure_config!(self.population.is_finite() && self.population > 0.0, "population must be > 0 (got {})", self.population);
        ensure_config!(self.days > 0, "days must be > 0");
        ensure_config!(self.contact_rate.is_finite() && self.contact_rate >= 0.0, "contact_rate must be >= 0 (got {})", self.contact_rate);
        ensure_config!(self.recovery_rate.is_finite() && self.recovery_rate > 0.0, "recovery_rate must be > 0 (got {})", self.recovery_rate);
        Ok(())
    }

    /// Initial compartments must be non-negative and sum to the population.
    pub fn check_initial(&self, values: &[f64]) -> Result<()> {
        ensure_config!(
            values.iter().all(|v| v.is_finite() && *v >= 0.0),
            "initial compartments must be non-negative (got {values:?})"
        );
        let total: f64 = values.iter().sum();
        ensure_config!(
            (total - self.population).abs() <= SUM_TOLERANCE * self.population,
            "initial compartments sum to {total}, expected population {}",
            self.population
        );
        Ok(())
    }
}

/// A compartmental model the simulation driver can advance.
pub trait Compartmental {
    /// Compartment order used by `initial`, `deriv` and the output rows.
    const COMPARTMENTS: &'static [Compartment];

    fn params(&self) -> &ModelParams;

    fn initial(&self) -> Vec<f64>;

    /// Pure right-hand side under the given contact rate.
    fn deriv(&self, contact_rate: f64, y: &[f64], dy: &mut [f64]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params() -> ModelParams {
        ModelParams { population: 1000.0, days: 10, contact_rate: 0.25, recovery_rate: 0.1 }
    }

    #[rstest]
    #[case(ModelParams { population: 0.0, ..params() })]
    #[case(ModelParams { population: -5.0, ..params() })]
    #[case(ModelParams { days: 0, ..params() })]
    #[case(ModelParams { contact_rate: -0.1, ..params() })]
    #[case(ModelParams { recovery_rate: 0.0, ..params() })]
    #[case(ModelParams { recovery_rate: f64::NAN, ..params() })]
    fn check_rejects_invalid_params(#[case] p: ModelParams) {
        assert!(p.check().is_err());
    }

    #[test]
    fn zero_contact_rate_is_allowed() {
        assert!(ModelParams { contact_rate: 0.0, ..params() }.check().is_ok());
    }

    #[rstest]
    #[case(&[999.0, 1.0, 0.0], true)]
    #[case(&[999.0005, 1.0, 0.0], true)]
    #[case(&[990.0, 1.0, 0.0], false)]
    #[case(&[1001.0, -1.0, 0.0], false)]
    fn check_initial_sum(#[case] values: &[f64], #[case] ok: bool) {
        assert_eq!(params().check_initial(values).is_ok(), ok);
    }
}
