use super::event::{Event, EventSchedule};
use super::series::TimeSeries;
use super::simulate::simulate;
use super::{Compartment, Compartmental, ModelParams};
use crate::error::Result;
use crate::math::ode::Integrator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirState {
    pub s: f64,
    pub i: f64,
    pub r: f64,
}

impl SirState {
    pub fn to_vec(self) -> Vec<f64> {
        vec![self.s, self.i, self.r]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SirConfig {
    pub params: ModelParams,
    pub initial: SirState,
}

/// Susceptible -> Infected -> Recovered.
#[derive(Debug, Clone)]
pub struct SirModel {
    cfg: SirConfig,
    events: EventSchedule,
    integrator: Integrator,
}

impl SirModel {
    pub fn new(cfg: SirConfig) -> Result<Self> {
        cfg.params.check()?;
        cfg.params.check_initial(&cfg.initial.to_vec())?;
        Ok(Self { cfg, events: EventSchedule::new(), integrator: Integrator::default() })
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Result<Self> {
        integrator.check()?;
        self.integrator = integrator;
        Ok(self)
    }

    pub fn config(&self) -> &SirConfig {
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

    /// Rows S, I, R with one value per day `0..days`.
    pub fn get_data(&self) -> Result<TimeSeries> {
        simulate(self, self.events.as_slice(), &self.integrator)
    }
}

impl Compartmental for SirModel {
    const COMPARTMENTS: &'static [Compartment] =
        &[Compartment::Susceptible, Compartment::Infected, Compartment::Recovered];

    fn params(&self) -> &ModelParams {
        &self.cfg.params
    }

    fn initial(&self) -> Vec<f64> {
        self.cfg.initial.to_vec()
    }

    fn deriv(&self, contact_rate: f64, y: &[f64], dy: &mut [f64]) {
        let (s, i) = (y[0], y[1]);
        let p = &self.cfg.params;
        let infections = contact_rate * s * i / p.population;
        let recoveries = p.recovery_rate * i;
        dy[0] = -infections;
        dy[1] = infections - recoveries;
        dy[2] = recoveries;
    }
}
