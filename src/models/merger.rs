//! Four-way merger model.
//!
//! The `Merger` fans the four storage lanes into a single output stream with
//! the same zero-latency drain discipline as a [`StorageBay`](super::StorageBay).
//! Planes that arrive in the same instant are queued in port order
//! `in1, in2, in3, in4`, whatever order they were produced in.

use crate::bag::Bag;
use crate::message::Message;
use crate::model::{Model, PortDesc};
use crate::models::drain::DrainQueue;
use crate::types::{PlaneId, SimTime};

pub const IN1: &str = "in1";
pub const IN2: &str = "in2";
pub const IN3: &str = "in3";
pub const IN4: &str = "in4";
/// Merged plane output.
pub const OUT: &str = "out";

/// Input ports in tie-break order.
pub const INPUTS: [&str; 4] = [IN1, IN2, IN3, IN4];

/// Fan-in of four plane streams.
#[derive(Clone, Debug, Default)]
pub struct Merger {
    buffer: DrainQueue,
}

impl Merger {
    /// Creates an empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Planes currently queued, front first.
    pub fn contents(&self) -> Vec<PlaneId> {
        self.buffer.contents()
    }
}

impl Model for Merger {
    fn kind(&self) -> &'static str {
        "Merger"
    }

    fn input_ports(&self) -> Vec<PortDesc> {
        INPUTS.iter().map(|&name| PortDesc::plane(name)).collect()
    }

    fn output_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(OUT)]
    }

    fn time_advance(&self) -> SimTime {
        self.buffer.time_advance()
    }

    fn internal_transition(&mut self, _now: SimTime) {
        self.buffer.advance();
    }

    fn external_transition(&mut self, _now: SimTime, _elapsed: SimTime, inputs: &Bag) {
        for port in INPUTS {
            for id in inputs.planes(port) {
                self.buffer.push(id);
            }
        }
    }

    fn output(&self) -> Bag {
        let mut bag = Bag::new();
        if let Some(id) = self.buffer.front() {
            bag.push(OUT, Message::Plane(id));
        }
        bag
    }

    fn state(&self) -> String {
        self.buffer.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merger_port_order_tie_break() {
        let mut merger = Merger::new();
        let bag = Bag::new()
            .with(IN4, Message::Plane(900))
            .with(IN2, Message::Plane(300))
            .with(IN1, Message::Plane(10))
            .with(IN2, Message::Plane(301));

        merger.external_transition(90.0, 90.0, &bag);
        assert_eq!(merger.contents(), vec![10, 300, 301, 900]);
    }

    #[test]
    fn test_merger_drains_in_queue_order() {
        let mut merger = Merger::new();
        let bag = Bag::new()
            .with(IN3, Message::Plane(600))
            .with(IN1, Message::Plane(5));
        merger.external_transition(0.0, 0.0, &bag);

        let mut emitted = Vec::new();
        while merger.time_advance() == 0.0 {
            emitted.extend(merger.output().planes(OUT));
            merger.internal_transition(0.0);
        }
        assert_eq!(emitted, vec![5, 600]);
    }

    #[test]
    fn test_merger_ports() {
        let merger = Merger::new();
        let names: Vec<_> = merger.input_ports().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["in1", "in2", "in3", "in4"]);
    }
}
