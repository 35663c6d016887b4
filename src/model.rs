//! Atomic model definitions and the `Model` trait.
//!
//! An atomic model is a timed state machine. It declares typed input and
//! output ports, tells the kernel how long it intends to stay in its current
//! state, and reacts to the expiry of that time (internal transition), to
//! incoming messages (external transition), or to both at once (confluent
//! transition).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bag::Bag;
use crate::message::PortType;
use crate::types::SimTime;

/// Describes an input or output port of a model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDesc {
    /// Name of the port (e.g., "in", "stop", "land")
    pub name: String,
    /// Type of message carried by the port
    pub ty: PortType,
}

impl PortDesc {
    /// Creates a new `PortDesc` with the given name and type.
    pub fn new(name: impl Into<String>, ty: PortType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Shorthand for a plane-carrying port.
    pub fn plane(name: impl Into<String>) -> Self {
        Self::new(name, PortType::Plane)
    }

    /// Shorthand for a signal port.
    pub fn signal(name: impl Into<String>) -> Self {
        Self::new(name, PortType::Signal)
    }
}

/// Order in which a model applies simultaneous internal and external events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfluentPolicy {
    /// Internal transition first, then external with zero elapsed time.
    #[default]
    InternalFirst,
    /// External transition first (elapsed = full time-advance), then internal.
    ExternalFirst,
}

impl fmt::Display for ConfluentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfluentPolicy::InternalFirst => f.write_str("internal_first"),
            ConfluentPolicy::ExternalFirst => f.write_str("external_first"),
        }
    }
}

/// The kind of transition the kernel applied to a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Internal,
    External,
    Confluent,
}

/// The core trait that all atomic models must implement.
///
/// The kernel owns the clock; models only see it through the `now` and
/// `elapsed` arguments. After any transition, `time_advance` must return a
/// non-negative value, and [`INFINITY`](crate::types::INFINITY) exactly when
/// nothing is pending.
///
/// A model that receives input while holding a finite time-advance is
/// expected to keep only the remaining part of it.
pub trait Model: Send {
    /// Short type name used in traces (e.g. `"Queue"`).
    fn kind(&self) -> &'static str;

    /// Input ports, in declaration order.
    fn input_ports(&self) -> Vec<PortDesc>;

    /// Output ports, in declaration order.
    fn output_ports(&self) -> Vec<PortDesc>;

    /// Time the model stays in its current state absent external input.
    fn time_advance(&self) -> SimTime;

    /// Called when the time-advance expires.
    fn internal_transition(&mut self, now: SimTime);

    /// Called when messages arrive before the time-advance expires.
    fn external_transition(&mut self, now: SimTime, elapsed: SimTime, inputs: &Bag);

    /// Called when messages arrive exactly as the time-advance expires.
    fn confluent_transition(&mut self, now: SimTime, inputs: &Bag, policy: ConfluentPolicy) {
        match policy {
            ConfluentPolicy::InternalFirst => {
                self.internal_transition(now);
                self.external_transition(now, 0.0, inputs);
            }
            ConfluentPolicy::ExternalFirst => {
                let elapsed = self.time_advance();
                self.external_transition(now, elapsed, inputs);
                self.internal_transition(now);
            }
        }
    }

    /// Messages emitted just before the internal transition.
    fn output(&self) -> Bag;

    /// Human-readable rendering of the current state for traces.
    fn state(&self) -> String;
}

/// Subtracts `elapsed` from a remaining time-advance.
///
/// Passive models stay passive and active ones never go negative.
#[inline]
pub fn remaining(sigma: SimTime, elapsed: SimTime) -> SimTime {
    if sigma.is_infinite() {
        sigma
    } else {
        (sigma - elapsed).max(0.0)
    }
}
