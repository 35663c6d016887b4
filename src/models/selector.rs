//! Hangar selector model.
//!
//! The `Selector` routes each landed plane to one of four storage bays by ID
//! range. Routing a plane takes a fixed time; planes arriving meanwhile wait
//! in a FIFO and are routed one after the other.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bag::Bag;
use crate::message::Message;
use crate::model::{remaining, Model, PortDesc};
use crate::types::{PlaneId, SimTime, INFINITY};

/// Plane input.
pub const IN: &str = "in";
pub const OUT1: &str = "out1";
pub const OUT2: &str = "out2";
pub const OUT3: &str = "out3";
pub const OUT4: &str = "out4";

/// Default routing time per plane.
pub const DEFAULT_ROUTING_TIME: SimTime = 30.0;

/// One of the four storage bays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bay {
    Bay1,
    Bay2,
    Bay3,
    Bay4,
}

impl Bay {
    pub const ALL: [Bay; 4] = [Bay::Bay1, Bay::Bay2, Bay::Bay3, Bay::Bay4];

    /// Selector output port feeding this bay.
    pub fn port(&self) -> &'static str {
        match self {
            Bay::Bay1 => OUT1,
            Bay::Bay2 => OUT2,
            Bay::Bay3 => OUT3,
            Bay::Bay4 => OUT4,
        }
    }
}

impl fmt::Display for Bay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bay::Bay1 => f.write_str("Bay1"),
            Bay::Bay2 => f.write_str("Bay2"),
            Bay::Bay3 => f.write_str("Bay3"),
            Bay::Bay4 => f.write_str("Bay4"),
        }
    }
}

/// Inclusive upper ID limit of each bay; the lower limit of Bay1 is 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BayLimits(pub [PlaneId; 4]);

impl Default for BayLimits {
    fn default() -> Self {
        BayLimits([249, 499, 749, 999])
    }
}

impl BayLimits {
    /// Returns the bay for `id` and whether `id` was inside the valid range.
    ///
    /// IDs outside `[0, last limit]` are assigned to Bay4.
    pub fn assign(&self, id: PlaneId) -> (Bay, bool) {
        if id < 0 {
            return (Bay::Bay4, false);
        }
        Bay::ALL
            .iter()
            .zip(self.0.iter())
            .find(|(_, &limit)| id <= limit)
            .map(|(&bay, _)| (bay, true))
            .unwrap_or((Bay::Bay4, false))
    }

    /// Returns true if the limits are non-negative and strictly increasing.
    pub fn is_valid(&self) -> bool {
        self.0[0] >= 0 && self.0.windows(2).all(|w| w[0] < w[1])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorPhase {
    Idle,
    Routing,
}

impl fmt::Display for SelectorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorPhase::Idle => f.write_str("IDLE"),
            SelectorPhase::Routing => f.write_str("ROUTING"),
        }
    }
}

/// ID-range router with per-plane latency.
///
/// # Example
///
/// ```rust
/// use tarmac::models::selector::{Bay, BayLimits};
///
/// let limits = BayLimits::default();
/// assert_eq!(limits.assign(249), (Bay::Bay1, true));
/// assert_eq!(limits.assign(250), (Bay::Bay2, true));
/// assert_eq!(limits.assign(1000), (Bay::Bay4, false));
/// ```
#[derive(Clone, Debug)]
pub struct Selector {
    phase: SelectorPhase,
    /// Plane being routed
    current: Option<PlaneId>,
    /// Planes waiting to be routed
    pending: VecDeque<PlaneId>,
    limits: BayLimits,
    routing_time: SimTime,
    sigma: SimTime,
    /// Planes routed to Bay4 because their ID was out of range
    out_of_range: u64,
}

impl Selector {
    /// Creates an idle selector with default limits and routing time.
    pub fn new() -> Self {
        Self {
            phase: SelectorPhase::Idle,
            current: None,
            pending: VecDeque::new(),
            limits: BayLimits::default(),
            routing_time: DEFAULT_ROUTING_TIME,
            sigma: INFINITY,
            out_of_range: 0,
        }
    }

    pub fn with_routing_time(mut self, routing_time: SimTime) -> Self {
        self.routing_time = routing_time;
        self
    }

    pub fn with_limits(mut self, limits: BayLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    pub fn current(&self) -> Option<PlaneId> {
        self.current
    }

    pub fn pending(&self) -> Vec<PlaneId> {
        self.pending.iter().copied().collect()
    }

    /// Number of out-of-range IDs routed so far.
    pub fn out_of_range(&self) -> u64 {
        self.out_of_range
    }

    /// Bay the current plane is heading to.
    pub fn destination(&self) -> Option<Bay> {
        self.current.map(|id| self.limits.assign(id).0)
    }

    fn start_routing(&mut self, id: PlaneId) {
        let (bay, in_range) = self.limits.assign(id);
        if !in_range {
            self.out_of_range += 1;
            tracing::warn!(plane = id, bay = %bay, "Plane ID out of range, routing to Bay4");
        }
        self.current = Some(id);
        self.phase = SelectorPhase::Routing;
        self.sigma = self.routing_time;
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Selector {
    fn kind(&self) -> &'static str {
        "Selector"
    }

    fn input_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(IN)]
    }

    fn output_ports(&self) -> Vec<PortDesc> {
        Bay::ALL.iter().map(|bay| PortDesc::plane(bay.port())).collect()
    }

    fn time_advance(&self) -> SimTime {
        self.sigma
    }

    fn internal_transition(&mut self, _now: SimTime) {
        match self.pending.pop_front() {
            Some(id) => self.start_routing(id),
            None => {
                self.phase = SelectorPhase::Idle;
                self.current = None;
                self.sigma = INFINITY;
            }
        }
    }

    fn external_transition(&mut self, _now: SimTime, elapsed: SimTime, inputs: &Bag) {
        if self.phase == SelectorPhase::Routing {
            self.sigma = remaining(self.sigma, elapsed);
        }

        for id in inputs.planes(IN) {
            if self.phase == SelectorPhase::Idle {
                self.start_routing(id);
            } else {
                self.pending.push_back(id);
            }
        }
    }

    fn output(&self) -> Bag {
        let mut bag = Bag::new();
        if self.phase == SelectorPhase::Routing {
            if let (Some(id), Some(bay)) = (self.current, self.destination()) {
                bag.push(bay.port(), Message::Plane(id));
            }
        }
        bag
    }

    fn state(&self) -> String {
        let plane = self.current.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        format!(
            "{{phase={}, plane={}, pending={}, sigma={}}}",
            self.phase,
            plane,
            self.pending.len(),
            self.sigma
        )
    }
}
