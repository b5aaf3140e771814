pub mod calibration;
pub mod error;
pub mod io;
pub mod log;
pub mod math;
pub mod model;
pub mod scenario;

pub use error::{Error, Result};
pub use math::ode::Integrator;
pub use model::event::{Event, EventSchedule, Intervention};
pub use model::seir::{SeirConfig, SeirModel, SeirState};
pub use model::series::TimeSeries;
pub use model::sir::{SirConfig, SirModel, SirState};
pub use model::{Compartment, ModelParams};
pub use scenario::{run, Scenario};
