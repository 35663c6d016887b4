//! Core type definitions for the simulation framework.
//!
//! This module defines the fundamental types used throughout the simulation kernel.

/// Simulation time unit (logical seconds).
///
/// The clock is a non-negative real value that only moves forward. Model
/// time-advances use the same representation, with [`INFINITY`] meaning
/// "no internal event scheduled".
pub type SimTime = f64;

/// Time-advance of a passive model.
pub const INFINITY: SimTime = f64::INFINITY;

/// Index of an atomic model inside a flattened simulation.
///
/// Identifiers are assigned in depth-first component order when a coupled
/// model is flattened, so they are stable for a given topology.
pub type ModelId = usize;

/// Identifier of a plane travelling through the airport.
///
/// Valid identifiers lie in `[0, 999]`; anything else is still carried
/// through the model graph but is flagged by the hangar selector.
pub type PlaneId = i64;

/// Port identifier type.
///
/// Used to identify specific input/output ports on a model.
pub type PortId = String;

/// Returns true if `time` is a usable clock value (finite and non-negative).
#[inline]
pub fn is_valid_time(time: SimTime) -> bool {
    time.is_finite() && time >= 0.0
}
