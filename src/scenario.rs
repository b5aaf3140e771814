//! Run configuration: everything needed to build a model and run it once.
//!
//! Defaults reproduce the classic single-city scenario: a population of one million with
//! a single initial infection, beta = 1/4, gamma = 1/10, sigma = 1/3 over 365 days.
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_config, Result};
use crate::math::ode::Integrator;
use crate::model::event::Event;
use crate::model::seir::{SeirConfig, SeirModel, SeirState};
use crate::model::series::TimeSeries;
use crate::model::sir::{SirConfig, SirModel, SirState};
use crate::model::ModelParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Sir,
    #[default]
    Seir,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialCompartments {
    pub s: f64,
    #[serde(default)]
    pub e: f64,
    pub i: f64,
    #[serde(default)]
    pub r: f64,
}

fn default_population() -> f64 {
    1e6
}

fn default_days() -> u32 {
    365
}

fn default_contact_rate() -> f64 {
    1.0 / 4.0
}

fn default_recovery_rate() -> f64 {
    1.0 / 10.0
}

fn default_incubation_rate() -> f64 {
    1.0 / 3.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub model: ModelKind,
    #[serde(default = "default_population")]
    pub population: f64,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_contact_rate")]
    pub contact_rate: f64,
    #[serde(default = "default_recovery_rate")]
    pub recovery_rate: f64,
    /// Ignored by SIR.
    #[serde(default = "default_incubation_rate")]
    pub incubation_rate: f64,
    /// Defaults to one infected and everyone else susceptible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<InitialCompartments>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub integrator: Integrator,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            population: default_population(),
            days: default_days(),
            contact_rate: default_contact_rate(),
            recovery_rate: default_recovery_rate(),
            incubation_rate: default_incubation_rate(),
            initial: None,
            events: Vec::new(),
            integrator: Integrator::default(),
        }
    }
}

/// A built model of either variant.
#[derive(Debug, Clone)]
pub enum Model {
    Sir(SirModel),
    Seir(SeirModel),
}

impl Model {
    pub fn get_data(&self) -> Result<TimeSeries> {
        match self {
            Model::Sir(m) => m.get_data(),
            Model::Seir(m) => m.get_data(),
        }
    }
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid scenario TOML")
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Failed to parse scenario file: {}", path.display()))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string(self).context("scenario cannot be written as TOML")
    }

    pub fn initial_compartments(&self) -> InitialCompartments {
        self.initial.unwrap_or(InitialCompartments {
            s: self.population - 1.0,
            e: 0.0,
            i: 1.0,
            r: 0.0,
        })
    }

    pub fn params(&self) -> ModelParams {
        ModelParams {
            population: self.population,
            days: self.days,
            contact_rate: self.contact_rate,
            recovery_rate: self.recovery_rate,
        }
    }

    /// Validate and build the model with its events registered.
    pub fn build(&self) -> Result<Model> {
        let init = self.initial_compartments();
        let model = match self.model {
            ModelKind::Sir => {
                ensure_config!(init.e == 0.0, "SIR has no exposed compartment (initial e = {})", init.e);
                let mut m = SirModel::new(SirConfig {
                    params: self.params(),
                    initial: SirState { s: init.s, i: init.i, r: init.r },
                })?
                .with_integrator(self.integrator)?;
                m.add_events(self.events.iter().cloned())?;
                Model::Sir(m)
            }
            ModelKind::Seir => {
                let mut m = SeirModel::new(SeirConfig {
                    params: self.params(),
                    incubation_rate: self.incubation_rate,
                    initial: SeirState { s: init.s, e: init.e, i: init.i, r: init.r },
                })?
                .with_integrator(self.integrator)?;
                m.add_events(self.events.iter().cloned())?;
                Model::Seir(m)
            }
        };
        Ok(model)
    }
}

/// Build the scenario's model and run it once.
pub fn run(scenario: &Scenario) -> Result<TimeSeries> {
    scenario.build()?.get_data()
}
