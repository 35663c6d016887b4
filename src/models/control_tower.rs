//! Control tower model.
//!
//! The `ControlTower` serializes access to the single runway. It buffers every
//! landing and takeoff request it receives, admits one at a time (landings
//! first), pauses both queues while the runway is assigned and releases them
//! once the runway hold is over.
//!
//! Cycle: `IDLE -> SIGNAL -> WAIT -> (SIGNAL | IDLE)`.

use std::collections::VecDeque;
use std::fmt;

use crate::bag::Bag;
use crate::message::Message;
use crate::model::{remaining, Model, PortDesc};
use crate::types::{PlaneId, SimTime, INFINITY};

/// Landing requests from the landing queue.
pub const IN_LANDING: &str = "in_landing";
/// Takeoff requests from the takeoff queue.
pub const IN_TAKEOFF: &str = "in_takeoff";
pub const STOP_LANDING: &str = "stop_landing";
pub const STOP_TAKEOFF: &str = "stop_takeoff";
pub const DONE_LANDING: &str = "done_landing";
pub const DONE_TAKEOFF: &str = "done_takeoff";
/// Landing command to the runway.
pub const LAND: &str = "land";
/// Takeoff command to the runway.
pub const TAKEOFF: &str = "takeoff";

/// Default runway hold, in simulation time units.
pub const DEFAULT_RUNWAY_TIME: SimTime = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TowerPhase {
    /// No plane admitted
    Idle,
    /// Commands are being sent (zero duration)
    Signal,
    /// Runway occupied by the admitted plane
    Wait,
}

impl fmt::Display for TowerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TowerPhase::Idle => f.write_str("IDLE"),
            TowerPhase::Signal => f.write_str("SIGNAL"),
            TowerPhase::Wait => f.write_str("WAIT"),
        }
    }
}

/// Kind of runway operation granted to the admitted plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    None,
    Landing,
    Takeoff,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::None => f.write_str("NONE"),
            Operation::Landing => f.write_str("LANDING"),
            Operation::Takeoff => f.write_str("TAKEOFF"),
        }
    }
}

/// Runway admission arbiter with landing priority.
///
/// # Example
///
/// ```rust
/// use tarmac::bag::Bag;
/// use tarmac::message::Message;
/// use tarmac::model::Model;
/// use tarmac::models::control_tower::{self, ControlTower, Operation};
///
/// let mut tower = ControlTower::new();
/// let requests = Bag::new()
///     .with(control_tower::IN_TAKEOFF, Message::Plane(7))
///     .with(control_tower::IN_LANDING, Message::Plane(5));
/// tower.external_transition(0.0, 0.0, &requests);
///
/// assert_eq!(tower.operation(), Operation::Landing);
/// assert_eq!(tower.plane(), Some(5));
/// assert_eq!(tower.pending_takeoffs(), vec![7]);
/// ```
#[derive(Clone, Debug)]
pub struct ControlTower {
    /// Current phase
    phase: TowerPhase,
    /// Operation granted to `plane`
    operation: Operation,
    /// Admitted plane, if any
    plane: Option<PlaneId>,
    /// Landing requests not yet admitted
    landings: VecDeque<PlaneId>,
    /// Takeoff requests not yet admitted
    takeoffs: VecDeque<PlaneId>,
    /// Duration of the runway hold
    runway_time: SimTime,
    /// Time until the next internal transition
    sigma: SimTime,
}

impl ControlTower {
    /// Creates an idle tower with the default runway hold.
    pub fn new() -> Self {
        Self {
            phase: TowerPhase::Idle,
            operation: Operation::None,
            plane: None,
            landings: VecDeque::new(),
            takeoffs: VecDeque::new(),
            runway_time: DEFAULT_RUNWAY_TIME,
            sigma: INFINITY,
        }
    }

    /// Sets the runway hold.
    pub fn with_runway_time(mut self, runway_time: SimTime) -> Self {
        self.runway_time = runway_time;
        self
    }

    pub fn phase(&self) -> TowerPhase {
        self.phase
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The admitted, not yet cleared, plane.
    pub fn plane(&self) -> Option<PlaneId> {
        self.plane
    }

    pub fn pending_landings(&self) -> Vec<PlaneId> {
        self.landings.iter().copied().collect()
    }

    pub fn pending_takeoffs(&self) -> Vec<PlaneId> {
        self.takeoffs.iter().copied().collect()
    }

    /// Admits the next pending request, landings first.
    fn admit(&mut self) -> bool {
        let next = if let Some(id) = self.landings.pop_front() {
            Some((id, Operation::Landing))
        } else {
            self.takeoffs.pop_front().map(|id| (id, Operation::Takeoff))
        };

        match next {
            Some((id, operation)) => {
                tracing::trace!(plane = id, %operation, "Admitting plane");
                self.plane = Some(id);
                self.operation = operation;
                self.phase = TowerPhase::Signal;
                self.sigma = 0.0;
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.plane = None;
        self.operation = Operation::None;
        self.phase = TowerPhase::Idle;
        self.sigma = INFINITY;
    }
}

impl Default for ControlTower {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for ControlTower {
    fn kind(&self) -> &'static str {
        "ControlTower"
    }

    fn input_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(IN_LANDING), PortDesc::plane(IN_TAKEOFF)]
    }

    fn output_ports(&self) -> Vec<PortDesc> {
        vec![
            PortDesc::signal(STOP_LANDING),
            PortDesc::signal(STOP_TAKEOFF),
            PortDesc::signal(DONE_LANDING),
            PortDesc::signal(DONE_TAKEOFF),
            PortDesc::plane(LAND),
            PortDesc::plane(TAKEOFF),
        ]
    }

    fn time_advance(&self) -> SimTime {
        self.sigma
    }

    fn internal_transition(&mut self, _now: SimTime) {
        match self.phase {
            TowerPhase::Signal => {
                self.phase = TowerPhase::Wait;
                self.sigma = self.runway_time;
            }
            TowerPhase::Wait => {
                if !self.admit() {
                    self.clear();
                }
            }
            TowerPhase::Idle => {
                self.sigma = INFINITY;
            }
        }
    }

    fn external_transition(&mut self, _now: SimTime, elapsed: SimTime, inputs: &Bag) {
        self.landings.extend(inputs.planes(IN_LANDING));
        self.takeoffs.extend(inputs.planes(IN_TAKEOFF));

        match self.phase {
            TowerPhase::Idle => {
                self.admit();
            }
            TowerPhase::Signal | TowerPhase::Wait => {
                self.sigma = remaining(self.sigma, elapsed);
            }
        }
    }

    fn output(&self) -> Bag {
        let mut bag = Bag::new();
        match self.phase {
            TowerPhase::Signal => {
                bag.push(STOP_LANDING, Message::Signal);
                bag.push(STOP_TAKEOFF, Message::Signal);
                if let Some(id) = self.plane {
                    match self.operation {
                        Operation::Landing => bag.push(LAND, Message::Plane(id)),
                        Operation::Takeoff => bag.push(TAKEOFF, Message::Plane(id)),
                        Operation::None => {}
                    }
                }
            }
            TowerPhase::Wait => {
                bag.push(DONE_LANDING, Message::Signal);
                bag.push(DONE_TAKEOFF, Message::Signal);
            }
            TowerPhase::Idle => {}
        }
        bag
    }

    fn state(&self) -> String {
        let plane = self.plane.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        format!(
            "{{phase={}, op={}, plane={}, landings={}, takeoffs={}, sigma={}}}",
            self.phase,
            self.operation,
            plane,
            self.landings.len(),
            self.takeoffs.len(),
            self.sigma
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landing(id: PlaneId) -> Bag {
        Bag::new().with(IN_LANDING, Message::Plane(id))
    }

    fn takeoff(id: PlaneId) -> Bag {
        Bag::new().with(IN_TAKEOFF, Message::Plane(id))
    }

    #[test]
    fn test_tower_admits_landing() {
        let mut tower = ControlTower::new();
        tower.external_transition(0.0, 0.0, &landing(100));

        assert_eq!(tower.phase(), TowerPhase::Signal);
        assert_eq!(tower.time_advance(), 0.0);

        let out = tower.output();
        assert!(out.has(STOP_LANDING));
        assert!(out.has(STOP_TAKEOFF));
        assert_eq!(out.planes(LAND).collect::<Vec<_>>(), vec![100]);
        assert!(!out.has(TAKEOFF));
    }

    #[test]
    fn test_tower_signal_then_wait_then_idle() {
        let mut tower = ControlTower::new();
        tower.external_transition(0.0, 0.0, &takeoff(3));
        tower.internal_transition(0.0);

        assert_eq!(tower.phase(), TowerPhase::Wait);
        assert_eq!(tower.time_advance(), 60.0);
        let out = tower.output();
        assert!(out.has(DONE_LANDING));
        assert!(out.has(DONE_TAKEOFF));

        tower.internal_transition(60.0);
        assert_eq!(tower.phase(), TowerPhase::Idle);
        assert_eq!(tower.operation(), Operation::None);
        assert!(tower.time_advance().is_infinite());
    }

    #[test]
    fn test_tower_landing_priority() {
        let mut tower = ControlTower::new();
        tower.external_transition(0.0, 0.0, &takeoff(1));
        tower.internal_transition(0.0);

        // Both requests arrive while the runway is held.
        let both = Bag::new()
            .with(IN_TAKEOFF, Message::Plane(7))
            .with(IN_LANDING, Message::Plane(5));
        tower.external_transition(10.0, 10.0, &both);
        assert_eq!(tower.phase(), TowerPhase::Wait);
        assert_eq!(tower.time_advance(), 50.0);

        tower.internal_transition(60.0);
        assert_eq!(tower.plane(), Some(5));
        assert_eq!(tower.operation(), Operation::Landing);

        tower.internal_transition(60.0);
        tower.internal_transition(120.0);
        assert_eq!(tower.plane(), Some(7));
        assert_eq!(tower.operation(), Operation::Takeoff);
    }

    #[test]
    fn test_tower_buffers_while_busy() {
        let mut tower = ControlTower::new();
        tower.external_transition(0.0, 0.0, &landing(1));
        tower.external_transition(0.0, 0.0, &landing(2));

        assert_eq!(tower.plane(), Some(1));
        assert_eq!(tower.pending_landings(), vec![2]);
        assert_eq!(tower.time_advance(), 0.0);
    }

    #[test]
    fn test_tower_custom_runway_time() {
        let mut tower = ControlTower::new().with_runway_time(45.0);
        tower.external_transition(0.0, 0.0, &landing(1));
        tower.internal_transition(0.0);
        assert_eq!(tower.time_advance(), 45.0);
    }

    #[test]
    fn test_tower_state_rendering() {
        let mut tower = ControlTower::new();
        assert_eq!(
            tower.state(),
            "{phase=IDLE, op=NONE, plane=-, landings=0, takeoffs=0, sigma=inf}"
        );
        tower.external_transition(0.0, 0.0, &landing(12));
        assert_eq!(
            tower.state(),
            "{phase=SIGNAL, op=LANDING, plane=12, landings=0, takeoffs=0, sigma=0}"
        );
    }
}
