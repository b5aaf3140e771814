use super::event::{Event, EventSchedule};
use super::series::TimeSeries;
use super::simulate::simulate;
use super::{Compartment, Compartmental, ModelParams};
use crate::error::{ensure_config, Result};
use crate::math::ode::Integrator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeirState {
    pub s: f64,
    pub e: f64,
    pub i: f64,
    pub r: f64,
}

impl SeirState {
    pub fn to_vec(self) -> Vec<f64> {
        vec![self.s, self.e, self.i, self.r]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeirConfig {
    pub params: ModelParams,
    /// 1 / mean incubation period (sigma, per day)
    pub incubation_rate: f64,
    pub initial: SeirState,
}

/// Susceptible -> Exposed -> Infected -> Recovered.
#[derive(Debug, Clone)]
pub struct SeirModel {
    cfg: SeirConfig,
    events: EventSchedule,
    integrator: Integrator,
}

impl SeirModel {
    pub fn new(cfg: SeirConfig) -> Result<Self> {
        cfg.params.check()?;
        ensure_config!(
            cfg.incubation_rate.is_finite() && cfg.incubation_rate > 0.0,
            "incubation_rate must be > 0 (got {})",
            cfg.incubation_rate
        );
        cfg.params.check_initial(&cfg.initial.to_vec())?;
        Ok(Self { cfg, events: EventSchedule::new(), integrator: Integrator::default() })
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Result<Self> {
        integrator.check()?;
        self.integrator = integrator;
        Ok(self)
    }

    pub fn config(&self) -> &SeirConfig {
        &self.cfg
    }

    pub fn events(&self) -> &EventSchedule {
        &self.events
    }

    /// Appends `events`; nothing is added if any of them is invalid.
    pub fn add_events(&mut self, events: impl IntoIterator<Item = Event>) -> Result<()> {
        let events: Vec<Event> = events.into_iter().collect();
        for event in &events {
            event.check()?;
        }
        self.events.add(events);
        Ok(())
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Rows S, E, I, R with one value per day `0..days`.
    pub fn get_data(&self) -> Result<TimeSeries> {
        simulate(self, self.events.as_slice(), &self.integrator)
    }
}

impl Compartmental for SeirModel {
    const COMPARTMENTS: &'static [Compartment] = &[
        Compartment::Susceptible,
        Compartment::Exposed,
        Compartment::Infected,
        Compartment::Recovered,
    ];

    fn params(&self) -> &ModelParams {
        &self.cfg.params
    }

    fn initial(&self) -> Vec<f64> {
        self.cfg.initial.to_vec()
    }

    fn deriv(&self, contact_rate: f64, y: &[f64], dy: &mut [f64]) {
        let (s, e, i) = (y[0], y[1], y[2]);
        let p = &self.cfg.params;
        let exposures = contact_rate * s * i / p.population;
        let onsets = self.cfg.incubation_rate * e;
        let recoveries = p.recovery_rate * i;
        dy[0] = -exposures;
        dy[1] = exposures - onsets;
        dy[2] = onsets - recoveries;
        dy[3] = recoveries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::sir::{SirConfig, SirModel, SirState};
    use float_cmp::assert_approx_eq;

    fn seir(days: u32, initial: SeirState) -> SeirModel {
        let population = initial.s + initial.e + initial.i + initial.r;
        SeirModel::new(SeirConfig {
            params: ModelParams { population, days, contact_rate: 0.25, recovery_rate: 0.1 },
            incubation_rate: 1.0 / 3.0,
            initial,
        })
        .unwrap()
    }

    fn seeded(days: u32) -> SeirModel {
        seir(days, SeirState { s: 1e6 - 1.0, e: 0.0, i: 1.0, r: 0.0 })
    }

    #[test]
    fn conserves_population() {
        let data = seeded(365).get_data().unwrap();
        assert_eq!(data.rows().len(), 4);
        for day in 0..data.days() {
            assert_approx_eq!(f64, data.total(day).unwrap(), 1e6, epsilon = 1.0);
        }
        let r = data.get(Compartment::Recovered).unwrap();
        assert!(r[364] > 0.5e6, "epidemic with R0 = 2.5 should infect most of the population");
    }

    #[test]
    fn exposed_feed_infected() {
        let data = seir(10, SeirState { s: 999.0, e: 1.0, i: 0.0, r: 0.0 }).get_data().unwrap();
        let i = data.get(Compartment::Infected).unwrap();
        assert_eq!(i[0], 0.0);
        assert!(i[1] > 0.0);
    }

    #[test]
    fn day_zero_event_applies_before_first_step() {
        let mut model = seeded(40);
        model.add_events(vec![Event::set_effective_r(0, 0.0)]).unwrap();
        let data = model.get_data().unwrap();
        let s = data.get(Compartment::Susceptible).unwrap();
        assert!(s.iter().all(|v| *v == 1e6 - 1.0));
    }

    #[test]
    fn all_same_day_events_apply_in_order() {
        let mut chained = seeded(60);
        chained
            .add_events(vec![Event::set_effective_r(20, 2.0), Event::scale_effective_r(20, 0.5)])
            .unwrap();
        let mut single = seeded(60);
        single.add_events(vec![Event::set_effective_r(20, 1.0)]).unwrap();

        let a = chained.get_data().unwrap();
        let b = single.get_data().unwrap();
        for (x, y) in a.rows().iter().flatten().zip(b.rows().iter().flatten()) {
            assert_approx_eq!(f64, *x, *y, epsilon = 1e-6 * x.abs().max(1.0));
        }
    }

    #[test]
    fn events_beyond_horizon_never_fire() {
        let base = seeded(30).get_data().unwrap();
        let mut model = seeded(30);
        model.add_events(vec![Event::set_effective_r(30, 0.0), Event::set_effective_r(99, 0.0)]).unwrap();
        assert_eq!(model.get_data().unwrap(), base);
    }

    #[test]
    fn event_without_susceptibles_fails() {
        let mut model = seir(10, SeirState { s: 0.0, e: 0.0, i: 100.0, r: 0.0 });
        model.add_events(vec![Event::set_effective_r(0, 1.0)]).unwrap();
        assert!(matches!(model.get_data(), Err(Error::DivisionUndefined { day: 0 })));
    }

    #[test]
    fn rejects_non_positive_incubation_rate() {
        let cfg = SeirConfig {
            params: ModelParams { population: 10.0, days: 5, contact_rate: 0.25, recovery_rate: 0.1 },
            incubation_rate: 0.0,
            initial: SeirState { s: 9.0, e: 0.0, i: 1.0, r: 0.0 },
        };
        assert!(matches!(SeirModel::new(cfg), Err(Error::Configuration(_))));
    }

    #[test]
    fn rejects_bad_integrator() {
        let err = seeded(5).with_integrator(Integrator::FixedRk4 { substeps: 0 }).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
    #[test]
    fn fast_incubation_is_integrated_as_stiff() {
        // sigma = 5000 relaxes E in 2e-4 days; the run should look like SIR with the same rates.
        let model = SeirModel::new(SeirConfig {
            params: ModelParams { population: 1e6, days: 30, contact_rate: 0.25, recovery_rate: 0.1 },
            incubation_rate: 5000.0,
            initial: SeirState { s: 1e6 - 1.0, e: 0.0, i: 1.0, r: 0.0 },
        })
        .unwrap();
        let data = model.get_data().unwrap();
        for day in 0..data.days() {
            assert_approx_eq!(f64, data.total(day).unwrap(), 1e6, epsilon = 1.0);
        }

        let sir = SirModel::new(SirConfig {
            params: model.config().params.clone(),
            initial: SirState { s: 1e6 - 1.0, i: 1.0, r: 0.0 },
        })
        .unwrap()
        .get_data()
        .unwrap();
        let e = data.get(Compartment::Exposed).unwrap();
        let i = data.get(Compartment::Infected).unwrap();
        let expected = sir.get(Compartment::Infected).unwrap();
        for day in 0..30 {
            let infectious = e[day] + i[day];
            assert_approx_eq!(f64, infectious, expected[day], epsilon = 0.01 * expected[day]);
        }
    }

    #[test]
    fn stiff_integrator_matches_adaptive() {
        let adaptive = seeded(60).get_data().unwrap();
        let stiff = seeded(60)
            .with_integrator(Integrator::Stiff { rtol: 1e-10, atol: 1e-10, max_steps: 5000 })
            .unwrap()
            .get_data()
            .unwrap();
        for (a, b) in adaptive.rows().iter().flatten().zip(stiff.rows().iter().flatten()) {
            assert_approx_eq!(f64, *a, *b, epsilon = 1e-4 * a.abs().max(1.0));
        }
    }
}
