//! Flow-controlled plane queue.
//!
//! The `Queue` holds plane requests for one runway lane (landing or takeoff)
//! and hands them to the control tower one at a time. The tower gates it with
//! a stop/done handshake: `stop` pauses the queue while the runway is being
//! assigned and `done` resumes it once the runway hold is over.

use std::collections::VecDeque;
use std::fmt;

use crate::bag::Bag;
use crate::message::Message;
use crate::model::{ConfluentPolicy, Model, PortDesc};
use crate::types::{PlaneId, SimTime, INFINITY};

/// Plane arrivals.
pub const IN: &str = "in";
/// Pause signal from the tower.
pub const STOP: &str = "stop";
/// Resume signal from the tower.
pub const DONE: &str = "done";
/// Plane handed to the tower.
pub const OUT: &str = "out";

/// Phase of a [`Queue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueuePhase {
    /// Nothing to send, or paused by the tower
    Idle,
    /// About to emit the front plane
    Sending,
    /// Front plane sent, waiting for `done`
    WaitAck,
}

impl fmt::Display for QueuePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueuePhase::Idle => f.write_str("IDLE"),
            QueuePhase::Sending => f.write_str("SENDING"),
            QueuePhase::WaitAck => f.write_str("WAIT_ACK"),
        }
    }
}

/// FIFO of plane requests with a stop/done handshake.
///
/// # Example
///
/// ```rust
/// use tarmac::bag::Bag;
/// use tarmac::message::Message;
/// use tarmac::model::Model;
/// use tarmac::models::queue::{self, Queue, QueuePhase};
///
/// let mut q = Queue::new();
/// q.external_transition(0.0, 0.0, &Bag::new().with(queue::IN, Message::Plane(1)));
/// assert_eq!(q.phase(), QueuePhase::Sending);
///
/// // The tower answers with stop while the plane is still queued.
/// q.external_transition(0.0, 0.0, &Bag::new().with(queue::STOP, Message::Signal));
/// assert_eq!(q.phase(), QueuePhase::Idle);
/// assert_eq!(q.front(), Some(1));
/// ```
#[derive(Clone, Debug)]
pub struct Queue {
    /// Current phase
    phase: QueuePhase,
    /// Waiting planes, front is the next to send
    elements: VecDeque<PlaneId>,
    /// Set by `stop`, cleared by `done`
    busy: bool,
    /// Time until the next internal transition
    sigma: SimTime,
}

impl Queue {
    /// Creates an empty, idle queue.
    pub fn new() -> Self {
        Self {
            phase: QueuePhase::Idle,
            elements: VecDeque::new(),
            busy: false,
            sigma: INFINITY,
        }
    }

    pub fn phase(&self) -> QueuePhase {
        self.phase
    }

    /// The plane that will be sent next.
    pub fn front(&self) -> Option<PlaneId> {
        self.elements.front().copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns true while the tower holds the queue paused.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn start_sending(&mut self) {
        self.phase = QueuePhase::Sending;
        self.sigma = 0.0;
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Queue {
    fn kind(&self) -> &'static str {
        "Queue"
    }

    fn input_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(IN), PortDesc::signal(STOP), PortDesc::signal(DONE)]
    }

    fn output_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(OUT)]
    }

    fn time_advance(&self) -> SimTime {
        self.sigma
    }

    fn internal_transition(&mut self, _now: SimTime) {
        if self.phase == QueuePhase::Sending {
            self.elements.pop_front();
            self.phase = QueuePhase::WaitAck;
            self.sigma = INFINITY;
        }
    }

    fn external_transition(&mut self, _now: SimTime, _elapsed: SimTime, inputs: &Bag) {
        if inputs.has(STOP) {
            self.busy = true;
            // The plane offered this instant was not taken; it stays at the front.
            if self.phase == QueuePhase::Sending {
                self.phase = QueuePhase::Idle;
            }
            self.sigma = INFINITY;
        }

        if inputs.has(DONE) {
            self.busy = false;
            if self.phase == QueuePhase::WaitAck {
                self.phase = QueuePhase::Idle;
            }
            if !self.elements.is_empty() && self.phase == QueuePhase::Idle {
                self.start_sending();
            }
        }

        self.elements.extend(inputs.planes(IN));

        if !self.elements.is_empty() && self.phase == QueuePhase::Idle && !self.busy {
            self.start_sending();
        }
    }

    /// The front was emitted at this instant and has already been delivered,
    /// so it leaves the buffer before `stop` or `done` is applied under
    /// either policy.
    fn confluent_transition(&mut self, now: SimTime, inputs: &Bag, _policy: ConfluentPolicy) {
        self.internal_transition(now);
        self.external_transition(now, 0.0, inputs);
    }

    fn output(&self) -> Bag {
        let mut bag = Bag::new();
        if self.phase == QueuePhase::Sending {
            if let Some(id) = self.front() {
                bag.push(OUT, Message::Plane(id));
            }
        }
        bag
    }

    fn state(&self) -> String {
        format!(
            "{{phase={}, size={}, busy={}, sigma={}}}",
            self.phase,
            self.elements.len(),
            self.busy,
            self.sigma
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(id: PlaneId) -> Bag {
        Bag::new().with(IN, Message::Plane(id))
    }

    fn stop() -> Bag {
        Bag::new().with(STOP, Message::Signal)
    }

    fn done() -> Bag {
        Bag::new().with(DONE, Message::Signal)
    }

    #[test]
    fn test_queue_initial_state() {
        let q = Queue::new();
        assert_eq!(q.phase(), QueuePhase::Idle);
        assert!(q.time_advance().is_infinite());
        assert!(q.output().is_empty());
        assert_eq!(q.state(), "{phase=IDLE, size=0, busy=false, sigma=inf}");
    }

    #[test]
    fn test_queue_arrival_starts_sending() {
        let mut q = Queue::new();
        q.external_transition(5.0, 5.0, &plane(42));

        assert_eq!(q.phase(), QueuePhase::Sending);
        assert_eq!(q.time_advance(), 0.0);
        assert_eq!(q.output().planes(OUT).collect::<Vec<_>>(), vec![42]);
    }

    #[test]
    fn test_queue_pops_after_output() {
        let mut q = Queue::new();
        q.external_transition(0.0, 0.0, &plane(1));
        q.internal_transition(0.0);

        assert_eq!(q.phase(), QueuePhase::WaitAck);
        assert!(q.is_empty());
        assert!(q.time_advance().is_infinite());
    }

    #[test]
    fn test_queue_fifo_with_handshake() {
        let mut q = Queue::new();
        let arrivals = Bag::new()
            .with(IN, Message::Plane(1))
            .with(IN, Message::Plane(2))
            .with(IN, Message::Plane(3));
        q.external_transition(0.0, 0.0, &arrivals);

        let mut sent = Vec::new();
        for cycle in 0..3 {
            let now = cycle as SimTime * 60.0;
            assert_eq!(q.phase(), QueuePhase::Sending);
            sent.extend(q.output().planes(OUT));
            q.internal_transition(now);
            q.external_transition(now, 0.0, &stop());
            // The runway hold ends and the tower releases the queue.
            q.external_transition(now + 60.0, 60.0, &done());
        }

        assert_eq!(sent, vec![1, 2, 3]);
        assert_eq!(q.phase(), QueuePhase::Idle);
        assert!(q.time_advance().is_infinite());
    }

    #[test]
    fn test_queue_stop_while_sending_keeps_front() {
        let mut q = Queue::new();
        q.external_transition(0.0, 0.0, &plane(7));
        q.external_transition(0.0, 0.0, &plane(8));
        assert_eq!(q.phase(), QueuePhase::Sending);

        q.external_transition(0.0, 0.0, &stop());
        assert_eq!(q.phase(), QueuePhase::Idle);
        assert!(q.is_busy());
        assert_eq!(q.front(), Some(7));
        assert_eq!(q.len(), 2);
        assert!(q.output().is_empty());

        // Arrivals while paused are queued but do not restart the send.
        q.external_transition(10.0, 10.0, &plane(9));
        assert_eq!(q.phase(), QueuePhase::Idle);
        assert_eq!(q.len(), 3);

        q.external_transition(60.0, 50.0, &done());
        assert_eq!(q.phase(), QueuePhase::Sending);
        assert_eq!(q.output().planes(OUT).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_queue_confluent_stop_pops_emitted_front() {
        for policy in [ConfluentPolicy::InternalFirst, ConfluentPolicy::ExternalFirst] {
            let mut q = Queue::new();
            let arrivals = Bag::new()
                .with(IN, Message::Plane(4))
                .with(IN, Message::Plane(5));
            q.external_transition(0.0, 0.0, &arrivals);
            assert_eq!(q.output().planes(OUT).collect::<Vec<_>>(), vec![4]);

            // The tower answers the request with stop in the same instant.
            q.confluent_transition(0.0, &stop(), policy);
            assert_eq!(q.phase(), QueuePhase::WaitAck, "policy {policy}");
            assert!(q.is_busy());
            assert_eq!(q.front(), Some(5));

            q.external_transition(60.0, 60.0, &done());
            assert_eq!(q.output().planes(OUT).collect::<Vec<_>>(), vec![5], "policy {policy}");
        }
    }

    #[test]
    fn test_queue_confluent_done_sends_next() {
        let mut q = Queue::new();
        q.external_transition(0.0, 0.0, &plane(1));
        q.external_transition(0.0, 0.0, &plane(2));

        q.confluent_transition(0.0, &done(), ConfluentPolicy::ExternalFirst);
        assert_eq!(q.phase(), QueuePhase::Sending);
        assert_eq!(q.output().planes(OUT).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_queue_done_on_empty_returns_idle() {
        let mut q = Queue::new();
        q.external_transition(0.0, 0.0, &plane(1));
        q.internal_transition(0.0);
        q.external_transition(0.0, 0.0, &stop());
        q.external_transition(60.0, 60.0, &done());

        assert_eq!(q.phase(), QueuePhase::Idle);
        assert!(!q.is_busy());
        assert!(q.time_advance().is_infinite());
    }
}
