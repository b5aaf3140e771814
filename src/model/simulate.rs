//! Day-by-day driver shared by all model variants.
use log::{debug, info, warn};

use super::event::{Event, RunQueue};
use super::series::TimeSeries;
use super::{Compartment, Compartmental, ModelParams};
use crate::error::Result;
use crate::math::ode::Integrator;

/// Run `model` over its horizon with `events` applied.
///
/// Nothing is mutated: the events are copied into a sorted [`RunQueue`] and the
/// result is recomputed from scratch on every call.
///
/// Day 0 holds the initial compartments. The contact rate active over
/// `[d, d + 1]` is the one left after the events of day `d`, which see the
/// susceptible count at the end of day `d`. All events due on a day are applied
/// in schedule order.
pub fn simulate<M: Compartmental>(model: &M, events: &[Event], integrator: &Integrator) -> Result<TimeSeries> {
    let params = model.params();
    let mut queue = RunQueue::new(events);

    for event in queue.remaining().filter(|e| e.day >= params.days) {
        warn!("event on day {} is beyond the {}-day horizon and will not fire", event.day, params.days);
    }
    info!(
        "simulating {} days of {:?} with {} event(s), contact rate {}",
        params.days,
        M::COMPARTMENTS,
        events.len(),
        params.contact_rate
    );

    let s_idx = M::COMPARTMENTS
        .iter()
        .position(|c| *c == Compartment::Susceptible)
        .unwrap_or(0);

    let mut y = model.initial();
    let mut states = Vec::with_capacity(params.days as usize);
    let mut contact_rate = retarget(&mut queue, 0, y[s_idx], params, params.contact_rate)?;
    states.push(y.clone());

    for day in 1..params.days {
        let t0 = f64::from(day - 1);
        integrator.advance(&mut y, t0, t0 + 1.0, |_, y, dy| model.deriv(contact_rate, y, dy))?;
        contact_rate = retarget(&mut queue, day, y[s_idx], params, contact_rate)?;
        states.push(y.clone());
    }

    Ok(TimeSeries::from_days(M::COMPARTMENTS, &states))
}

/// Apply every event due on `day`, returning the contact rate for the next interval.
fn retarget(queue: &mut RunQueue, day: u32, susceptible: f64, params: &ModelParams, mut contact_rate: f64) -> Result<f64> {
    let s = susceptible / params.population;
    while let Some(event) = queue.consume_due(day) {
        let next = event.apply(contact_rate, s, params.recovery_rate)?;
        debug!("day {day}: {}, contact rate {contact_rate:.6} -> {next:.6}", event.action);
        contact_rate = next;
    }
    Ok(contact_rate)
}
