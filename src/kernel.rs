//! Discrete-event simulation kernel.
//!
//! The [`Simulation`] owns the clock and every atomic model of a flattened
//! coupled model. Each [`step`](Simulation::step) handles one instant:
//!
//! 1. the clock jumps to the earliest scheduled internal event or external input;
//! 2. every imminent model produces its output;
//! 3. messages are routed into per-model bags, together with the external
//!    inputs due at this instant;
//! 4. transitions are applied in model-id order.
//!
//! Models whose new time-advance is zero are imminent again at the same clock
//! value, so the next step runs at the same instant. The number of consecutive
//! steps at one instant is bounded to catch zero-time loops.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, trace};

use crate::bag::Bag;
use crate::coupled::Coupled;
use crate::coupling::{RoutingTable, Target};
use crate::message::{ExternalEvent, Message, PortType};
use crate::model::{ConfluentPolicy, Model, Transition};
use crate::stats::{ModelStats, SimulationStats};
use crate::trace::{TraceRecord, TraceSink};
use crate::types::{is_valid_time, ModelId, SimTime, INFINITY};

/// Default bound on consecutive steps at one instant.
pub const DEFAULT_MAX_CASCADE: usize = 10_000;

/// Errors raised while running a simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("No more events scheduled")]
    NoMoreEvents,

    #[error("Unknown top-level input port `{0}`")]
    UnknownInputPort(String),

    #[error("Cannot inject a {found} message on {expected} port `{port}`")]
    TypeMismatch {
        port: String,
        expected: PortType,
        found: PortType,
    },

    #[error("Event at {time} is earlier than the clock ({clock})")]
    EventInPast { time: SimTime, clock: SimTime },

    #[error("Invalid simulation time {0}")]
    InvalidTime(SimTime),

    #[error("Model `{model}` returned invalid time advance {value}")]
    InvalidTimeAdvance { model: String, value: SimTime },

    #[error("Livelock at time {time}: more than {limit} steps without advancing the clock")]
    Livelock { time: SimTime, limit: usize },

    #[error("Trace sink error: {0}")]
    Trace(#[from] std::io::Error),
}

/// Result type for kernel operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// No model has a finite time advance and no input is pending.
    Exhausted,
    /// The next event lies beyond the horizon.
    HorizonReached,
}

/// An atomic model with its scheduling bookkeeping.
struct Slot {
    path: String,
    model: Box<dyn Model>,
    /// Time of the last transition
    last_event: SimTime,
    /// Time of the next internal transition
    next_event: SimTime,
}

/// A runnable simulation of one coupled model.
///
/// # Example
///
/// ```rust
/// use tarmac::airport::{airport_top, AirportParams, IN_LANDING, OUT_TAKEOFF};
/// use tarmac::kernel::{RunOutcome, Simulation};
/// use tarmac::message::Message;
///
/// let top = airport_top(&AirportParams::default()).unwrap();
/// let mut sim = Simulation::new(top);
/// sim.inject(0.0, IN_LANDING, Message::Plane(100)).unwrap();
///
/// assert_eq!(sim.run().unwrap(), RunOutcome::Exhausted);
/// let departures = sim.outputs();
/// assert_eq!(departures.len(), 1);
/// assert_eq!(departures[0].time, 150.0);
/// assert_eq!(departures[0].port, OUT_TAKEOFF);
/// ```
pub struct Simulation {
    name: String,
    slots: Vec<Slot>,
    routes: RoutingTable,
    clock: SimTime,
    /// External inputs ordered by time, stable for equal times
    pending: Vec<ExternalEvent>,
    policy: ConfluentPolicy,
    max_cascade: usize,
    /// Time of the last executed step
    last_step: Option<SimTime>,
    /// Steps executed at `last_step`
    cascade: usize,
    started: bool,
    sinks: Vec<Box<dyn TraceSink>>,
    outputs: Vec<ExternalEvent>,
    stats: SimulationStats,
}

impl Simulation {
    /// Flattens `top` and schedules every model from time zero.
    pub fn new(top: Coupled) -> Self {
        let name = top.name().to_string();
        let (atoms, routes) = top.flatten();

        let mut stats = SimulationStats::new().with_name(name.clone());
        stats.kernel.model_count = atoms.len();
        stats.kernel.route_count = routes.route_count();

        let slots: Vec<Slot> = atoms
            .into_iter()
            .enumerate()
            .map(|(id, atom)| {
                stats
                    .models
                    .insert(atom.path.clone(), ModelStats::new(id, atom.model.kind()));
                let ta = atom.model.time_advance();
                Slot {
                    path: atom.path,
                    model: atom.model,
                    last_event: 0.0,
                    next_event: if ta >= 0.0 { ta } else { INFINITY },
                }
            })
            .collect();

        debug!(
            model = %name,
            models = slots.len(),
            routes = stats.kernel.route_count,
            "Simulation created"
        );

        Self {
            name,
            slots,
            routes,
            clock: 0.0,
            pending: Vec::new(),
            policy: ConfluentPolicy::default(),
            max_cascade: DEFAULT_MAX_CASCADE,
            last_step: None,
            cascade: 0,
            started: false,
            sinks: Vec::new(),
            outputs: Vec::new(),
            stats,
        }
    }

    /// Sets the confluent transition policy.
    pub fn with_policy(mut self, policy: ConfluentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the bound on consecutive steps at one instant.
    pub fn with_max_cascade(mut self, max_cascade: usize) -> Self {
        self.max_cascade = max_cascade;
        self
    }

    /// Attaches a trace sink.
    pub fn with_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Attaches a boxed trace sink.
    pub fn add_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sinks.push(sink);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current simulation time.
    pub fn clock(&self) -> SimTime {
        self.clock
    }

    pub fn policy(&self) -> ConfluentPolicy {
        self.policy
    }

    pub fn model_count(&self) -> usize {
        self.slots.len()
    }

    /// Dotted paths of all atomic models, in id order.
    pub fn model_paths(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.path.as_str()).collect()
    }

    /// Id of the model at `path`.
    pub fn model_id(&self, path: &str) -> Option<ModelId> {
        self.slots.iter().position(|s| s.path == path)
    }

    /// Current state rendering of the model at `path`.
    pub fn model_state(&self, path: &str) -> Option<String> {
        self.slots.iter().find(|s| s.path == path).map(|s| s.model.state())
    }

    /// Flattened routing table.
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Messages emitted on top-level output ports so far.
    pub fn outputs(&self) -> &[ExternalEvent] {
        &self.outputs
    }

    /// Drains the collected top-level outputs.
    pub fn take_outputs(&mut self) -> Vec<ExternalEvent> {
        std::mem::take(&mut self.outputs)
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Number of external inputs not yet delivered.
    pub fn pending_inputs(&self) -> usize {
        self.pending.len()
    }

    /// Schedules `message` on the top-level input `port` at `time`.
    pub fn inject(&mut self, time: SimTime, port: &str, message: Message) -> SimulationResult<()> {
        if !is_valid_time(time) {
            return Err(SimulationError::InvalidTime(time));
        }
        if time < self.clock {
            return Err(SimulationError::EventInPast {
                time,
                clock: self.clock,
            });
        }
        let desc = self
            .routes
            .input_port(port)
            .ok_or_else(|| SimulationError::UnknownInputPort(port.to_string()))?;
        if desc.ty != message.port_type() {
            return Err(SimulationError::TypeMismatch {
                port: port.to_string(),
                expected: desc.ty,
                found: message.port_type(),
            });
        }

        let at = self.pending.partition_point(|e| e.time <= time);
        self.pending.insert(at, ExternalEvent::new(time, port, message));
        Ok(())
    }

    /// Schedules a batch of external events.
    pub fn inject_all(
        &mut self,
        events: impl IntoIterator<Item = ExternalEvent>,
    ) -> SimulationResult<()> {
        for event in events {
            self.inject(event.time, &event.port, event.message)?;
        }
        Ok(())
    }

    /// Time of the next instant.
    pub fn next_event_time(&self) -> SimulationResult<SimTime> {
        let internal = self
            .slots
            .iter()
            .map(|s| s.next_event)
            .fold(INFINITY, SimTime::min);
        let external = self.pending.first().map(|e| e.time).unwrap_or(INFINITY);
        let next = internal.min(external);

        if next.is_finite() {
            Ok(next)
        } else {
            Err(SimulationError::NoMoreEvents)
        }
    }

    /// Records initial states and checks initial time advances.
    fn start(&mut self) -> SimulationResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.stats.record_start();

        let mut records = Vec::with_capacity(self.slots.len());
        for (id, slot) in self.slots.iter().enumerate() {
            check_time_advance(slot)?;
            records.push(TraceRecord::state(self.clock, id, slot.path.clone(), slot.model.state()));
        }
        self.emit(&records)
    }

    /// Executes one instant.
    pub fn step(&mut self) -> SimulationResult<()> {
        self.start()?;
        let now = self.next_event_time()?;

        if self.last_step == Some(now) {
            self.cascade += 1;
            if self.cascade > self.max_cascade {
                return Err(SimulationError::Livelock {
                    time: now,
                    limit: self.max_cascade,
                });
            }
        } else {
            self.cascade = 1;
            self.stats.kernel.instants += 1;
        }
        self.stats.kernel.longest_cascade = self.stats.kernel.longest_cascade.max(self.cascade as u64);
        self.last_step = Some(now);
        self.clock = now;

        let imminent: Vec<ModelId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.next_event == now)
            .map(|(id, _)| id)
            .collect();

        debug!(time = now, imminent = imminent.len(), cascade = self.cascade, "Step");

        let mut records = Vec::new();
        let mut inbox: BTreeMap<ModelId, Bag> = BTreeMap::new();

        // 1) Outputs of imminent models
        for &id in &imminent {
            let slot = &self.slots[id];
            let out = slot.model.output();
            for (port, message) in out.iter() {
                records.push(TraceRecord::message(
                    now,
                    id,
                    slot.path.clone(),
                    port,
                    message.to_string(),
                ));
                self.stats.kernel.messages_emitted += 1;
                if let Some(m) = self.stats.models.get_mut(&slot.path) {
                    m.messages_emitted += 1;
                }

                let targets = self.routes.targets(id, port);
                if targets.is_empty() {
                    self.stats.kernel.messages_unrouted += 1;
                    trace!(model = %slot.path, port, "Output port is not coupled");
                }
                for target in targets {
                    match target {
                        Target::Model(dst) => {
                            inbox.entry(dst.model).or_default().push(dst.port.clone(), *message);
                        }
                        Target::Output(name) => {
                            self.outputs.push(ExternalEvent::new(now, name.clone(), *message));
                            self.stats.kernel.boundary_outputs += 1;
                        }
                    }
                }
            }
        }

        // 2) External inputs due now
        let due = self.pending.partition_point(|e| e.time <= now);
        for event in self.pending.drain(..due) {
            self.stats.kernel.external_inputs += 1;
            let targets = self.routes.input_targets(&event.port);
            if targets.is_empty() {
                self.stats.kernel.messages_unrouted += 1;
            }
            for dst in targets {
                inbox.entry(dst.model).or_default().push(dst.port.clone(), event.message);
            }
        }

        // 3) Transitions
        let touched: BTreeSet<ModelId> = imminent.iter().copied().chain(inbox.keys().copied()).collect();
        for id in touched {
            let bag = inbox.remove(&id);
            let slot = &mut self.slots[id];
            let is_imminent = slot.next_event == now;

            let transition = match bag {
                None if is_imminent => {
                    slot.model.internal_transition(now);
                    Transition::Internal
                }
                Some(bag) if is_imminent => {
                    self.stats.kernel.messages_delivered += bag.len() as u64;
                    if let Some(m) = self.stats.models.get_mut(&slot.path) {
                        m.messages_received += bag.len() as u64;
                    }
                    slot.model.confluent_transition(now, &bag, self.policy);
                    Transition::Confluent
                }
                Some(bag) => {
                    self.stats.kernel.messages_delivered += bag.len() as u64;
                    if let Some(m) = self.stats.models.get_mut(&slot.path) {
                        m.messages_received += bag.len() as u64;
                    }
                    let elapsed = now - slot.last_event;
                    slot.model.external_transition(now, elapsed, &bag);
                    Transition::External
                }
                None => continue,
            };

            check_time_advance(slot)?;
            let ta = slot.model.time_advance();
            slot.last_event = now;
            slot.next_event = now + ta;

            trace!(model = %slot.path, ?transition, ta, "Transition");
            self.stats.record_transition(&slot.path, transition);
            records.push(TraceRecord::state(now, id, slot.path.clone(), slot.model.state()));
        }

        self.stats.kernel.steps_executed += 1;
        self.stats.kernel.final_time = now;
        self.emit(&records)
    }

    /// Steps while the next instant is at or before `horizon`.
    pub fn run_until(&mut self, horizon: SimTime) -> SimulationResult<RunOutcome> {
        if horizon.is_nan() || horizon < 0.0 {
            return Err(SimulationError::InvalidTime(horizon));
        }
        self.start()?;

        let outcome = loop {
            match self.next_event_time() {
                Err(SimulationError::NoMoreEvents) => break RunOutcome::Exhausted,
                Err(e) => return Err(e),
                Ok(next) if next > horizon => break RunOutcome::HorizonReached,
                Ok(_) => self.step()?,
            }
        };

        self.stats.record_end();
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        debug!(time = self.clock, ?outcome, steps = self.stats.kernel.steps_executed, "Run finished");
        Ok(outcome)
    }

    /// Runs until no event is left.
    pub fn run(&mut self) -> SimulationResult<RunOutcome> {
        self.run_until(INFINITY)
    }

    fn emit(&mut self, records: &[TraceRecord]) -> SimulationResult<()> {
        for sink in &mut self.sinks {
            for record in records {
                sink.record(record)?;
            }
        }
        Ok(())
    }
}

fn check_time_advance(slot: &Slot) -> SimulationResult<()> {
    let ta = slot.model.time_advance();
    if ta.is_nan() || ta < 0.0 {
        return Err(SimulationError::InvalidTimeAdvance {
            model: slot.path.clone(),
            value: ta,
        });
    }
    Ok(())
}
