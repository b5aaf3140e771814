//! Conversion between the contact rate and the effective reproduction number
//! R = beta * s / gamma, where s is the susceptible fraction.
use crate::error::{Error, Result};

/// Effective reproduction number for a contact rate at susceptible fraction `s`.
pub fn effective_r(contact_rate: f64, s: f64, recovery_rate: f64) -> f64 {
    contact_rate * s / recovery_rate
}

/// Contact rate that yields `effective_r` at susceptible fraction `s`.
/// `None` unless `s` is positive.
pub fn contact_rate_for(effective_r: f64, s: f64, recovery_rate: f64) -> Option<f64> {
    if s <= 0.0 {
        return None;
    }
    Some(effective_r * recovery_rate / s)
}

/// Re-express the current contact rate as R, map it through `f`, and convert back.
///
/// `day` is only used to label errors.
pub fn apply_transform<F>(day: u32, contact_rate: f64, s: f64, recovery_rate: f64, f: F) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    if s <= 0.0 {
        return Err(Error::DivisionUndefined { day });
    }
    let r_new = f(effective_r(contact_rate, s, recovery_rate));
    if !r_new.is_finite() || r_new < 0.0 {
        return Err(Error::InvalidTransform { day, value: r_new });
    }
    contact_rate_for(r_new, s, recovery_rate).ok_or(Error::DivisionUndefined { day })
}
