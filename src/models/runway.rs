//! Runway model.
//!
//! The single runway is an exclusive resource: it accepts one landing or
//! takeoff command, stays occupied for the operation time, then releases the
//! plane on the matching exit port. The control tower guarantees that no
//! second command arrives while the runway is occupied; if one does, it is
//! reported as a protocol violation and the current operation continues.

use std::fmt;

use crate::bag::Bag;
use crate::message::Message;
use crate::model::{remaining, Model, PortDesc};
use crate::types::{PlaneId, SimTime, INFINITY};

/// Landing command.
pub const LAND: &str = "land";
/// Takeoff command.
pub const TAKEOFF: &str = "takeoff";
/// Landed plane, towards the hangar.
pub const LANDING_EXIT: &str = "landing_exit";
/// Departed plane.
pub const TAKEOFF_EXIT: &str = "takeoff_exit";

/// Default operation time, in simulation time units.
pub const DEFAULT_OPERATION_TIME: SimTime = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunwayPhase {
    Idle,
    Landing,
    Takeoff,
}

impl RunwayPhase {
    /// Returns true while a plane is on the runway.
    pub fn is_occupied(&self) -> bool {
        !matches!(self, RunwayPhase::Idle)
    }
}

impl fmt::Display for RunwayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunwayPhase::Idle => f.write_str("IDLE"),
            RunwayPhase::Landing => f.write_str("LANDING"),
            RunwayPhase::Takeoff => f.write_str("TAKEOFF"),
        }
    }
}

/// Single exclusive runway.
#[derive(Clone, Debug)]
pub struct Runway {
    phase: RunwayPhase,
    /// Plane on the runway
    plane: Option<PlaneId>,
    /// Duration of one landing or takeoff
    operation_time: SimTime,
    sigma: SimTime,
    /// Commands refused because the runway was occupied
    violations: u64,
}

impl Runway {
    /// Creates a free runway with the default operation time.
    pub fn new() -> Self {
        Self {
            phase: RunwayPhase::Idle,
            plane: None,
            operation_time: DEFAULT_OPERATION_TIME,
            sigma: INFINITY,
            violations: 0,
        }
    }

    /// Sets the operation time.
    pub fn with_operation_time(mut self, operation_time: SimTime) -> Self {
        self.operation_time = operation_time;
        self
    }

    pub fn phase(&self) -> RunwayPhase {
        self.phase
    }

    pub fn plane(&self) -> Option<PlaneId> {
        self.plane
    }

    /// Number of commands refused so far.
    pub fn violations(&self) -> u64 {
        self.violations
    }

    fn refuse(&mut self, now: SimTime, port: &str, id: PlaneId) {
        self.violations += 1;
        tracing::error!(
            time = now,
            plane = id,
            command = port,
            phase = %self.phase,
            occupant = ?self.plane,
            "Runway command refused: runway already assigned"
        );
    }
}

impl Default for Runway {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Runway {
    fn kind(&self) -> &'static str {
        "Runway"
    }

    fn input_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(LAND), PortDesc::plane(TAKEOFF)]
    }

    fn output_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(LANDING_EXIT), PortDesc::plane(TAKEOFF_EXIT)]
    }

    fn time_advance(&self) -> SimTime {
        self.sigma
    }

    fn internal_transition(&mut self, _now: SimTime) {
        self.phase = RunwayPhase::Idle;
        self.plane = None;
        self.sigma = INFINITY;
    }

    fn external_transition(&mut self, now: SimTime, elapsed: SimTime, inputs: &Bag) {
        let commands = inputs
            .planes(LAND)
            .map(|id| (LAND, id))
            .chain(inputs.planes(TAKEOFF).map(|id| (TAKEOFF, id)));

        if self.phase.is_occupied() {
            self.sigma = remaining(self.sigma, elapsed);
            for (port, id) in commands {
                self.refuse(now, port, id);
            }
            return;
        }

        // Landings are listed first, so a simultaneous takeoff is the one refused.
        for (port, id) in commands {
            if self.phase.is_occupied() {
                self.refuse(now, port, id);
                continue;
            }
            self.phase = if port == LAND {
                RunwayPhase::Landing
            } else {
                RunwayPhase::Takeoff
            };
            self.plane = Some(id);
            self.sigma = self.operation_time;
        }
    }

    fn output(&self) -> Bag {
        let mut bag = Bag::new();
        if let Some(id) = self.plane {
            match self.phase {
                RunwayPhase::Landing => bag.push(LANDING_EXIT, Message::Plane(id)),
                RunwayPhase::Takeoff => bag.push(TAKEOFF_EXIT, Message::Plane(id)),
                RunwayPhase::Idle => {}
            }
        }
        bag
    }

    fn state(&self) -> String {
        let plane = self.plane.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        format!("{{phase={}, plane={}, sigma={}}}", self.phase, plane, self.sigma)
    }
}
