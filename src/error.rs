//! Errors raised by model construction and simulation runs.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid constructor arguments. Raised at construction, never deferred to a run.
    #[error("invalid model configuration: {0}")]
    Configuration(String),

    /// An event fired while no susceptibles were left, so R cannot be mapped back to a rate.
    #[error("cannot apply event on day {day}: susceptible fraction is zero")]
    DivisionUndefined { day: u32 },

    /// The integrator could not meet its tolerance within its step budget.
    #[error("integration failed at t={t} after {steps} step attempts")]
    IntegrationFailure { t: f64, steps: usize },

    /// A transform produced a negative or non-finite effective R.
    #[error("event on day {day} produced invalid effective R {value}")]
    InvalidTransform { day: u32, value: f64 },
}

/// Like `anyhow::ensure!`, but yields [`Error::Configuration`].
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::Error::Configuration(format!($($arg)+)));
        }
    };
}
pub(crate) use ensure_config;
