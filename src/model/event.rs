//! Scheduled interventions and their day-ordered consumption.
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::calibration::apply_transform;
use crate::error::{ensure_config, Result};

/// Opaque pure map from effective R to a new effective R.
#[derive(Clone)]
pub struct TransformFn(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl TransformFn {
    pub fn new(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, r: f64) -> f64 {
        (self.0)(r)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn(..)")
    }
}

/// What an event does to the effective reproduction number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intervention {
    /// Retarget transmission so that effective R becomes `value`.
    SetEffectiveR { value: f64 },
    /// Multiply the current effective R by `factor`.
    ScaleEffectiveR { factor: f64 },
    #[serde(skip)]
    Custom(TransformFn),
}

impl Intervention {
    pub fn transform(&self, r: f64) -> f64 {
        match self {
            Intervention::SetEffectiveR { value } => *value,
            Intervention::ScaleEffectiveR { factor } => r * factor,
            Intervention::Custom(f) => f.call(r),
        }
    }
}

impl fmt::Display for Intervention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intervention::SetEffectiveR { value } => write!(f, "set effective R to {value}"),
            Intervention::ScaleEffectiveR { factor } => write!(f, "scale effective R by {factor}"),
            Intervention::Custom(_) => f.write_str("custom transform"),
        }
    }
}

/// A one-time change to the active contact rate at the end of `day`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub day: u32,
    pub action: Intervention,
}

impl Event {
    /// Event with an arbitrary transform. `f` must be side-effect free.
    pub fn new(day: u32, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self { day, action: Intervention::Custom(TransformFn::new(f)) }
    }

    pub fn set_effective_r(day: u32, value: f64) -> Self {
        Self { day, action: Intervention::SetEffectiveR { value } }
    }

    pub fn scale_effective_r(day: u32, factor: f64) -> Self {
        Self { day, action: Intervention::ScaleEffectiveR { factor } }
    }

    pub fn check(&self) -> Result<()> {
        match self.action {
            Intervention::SetEffectiveR { value } => {
                ensure_config!(value >= 0.0 && value.is_finite(), "day {} event: effective R must be >= 0 (got {value})", self.day);
            }
            Intervention::ScaleEffectiveR { factor } => {
                ensure_config!(factor >= 0.0 && factor.is_finite(), "day {} event: scale factor must be >= 0 (got {factor})", self.day);
            }
            Intervention::Custom(_) => {}
        }
        Ok(())
    }

    /// New contact rate after this event, given the susceptible fraction `s`.
    pub fn apply(&self, contact_rate: f64, s: f64, recovery_rate: f64) -> Result<f64> {
        apply_transform(self.day, contact_rate, s, recovery_rate, |r| self.action.transform(r))
    }
}

/// Events registered on a model, in registration order.
#[derive(Debug, Clone, Default)]
pub struct EventSchedule {
    events: Vec<Event>,
}

impl EventSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends without sorting or deduplicating.
    pub fn add(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn begin_run(&self) -> RunQueue {
        RunQueue::new(&self.events)
    }
}

/// Day-sorted working copy consumed front to back during one run.
#[derive(Debug, Clone)]
pub struct RunQueue {
    pending: VecDeque<Event>,
}

impl RunQueue {
    /// Stable sort: events sharing a day keep their given order.
    pub fn new(events: &[Event]) -> Self {
        let mut sorted = events.to_vec();
        sorted.sort_by_key(|e| e.day);
        Self { pending: sorted.into() }
    }

    /// Pops the head if it is due on `day`. Only the head is examined.
    pub fn consume_due(&mut self, day: u32) -> Option<Event> {
        if self.pending.front()?.day != day {
            return None;
        }
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Events left unconsumed.
    pub fn remaining(&self) -> impl Iterator<Item = &Event> {
        self.pending.iter()
    }
}
