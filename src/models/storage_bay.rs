//! Storage bay model.
//!
//! A `StorageBay` is a zero-latency pass-through lane: planes are buffered on
//! arrival and re-emitted one per instant in arrival order.

use crate::bag::Bag;
use crate::message::Message;
use crate::model::{Model, PortDesc};
use crate::models::drain::DrainQueue;
use crate::types::{PlaneId, SimTime};

/// Plane input.
pub const IN: &str = "in";
/// Plane output.
pub const OUT: &str = "out";

/// A pass-through FIFO with no latency.
///
/// # Example
///
/// ```rust
/// use tarmac::bag::Bag;
/// use tarmac::message::Message;
/// use tarmac::model::Model;
/// use tarmac::models::{storage_bay, StorageBay};
///
/// let mut bay = StorageBay::new();
/// bay.external_transition(90.0, 90.0, &Bag::new().with(storage_bay::IN, Message::Plane(100)));
///
/// assert_eq!(bay.time_advance(), 0.0);
/// assert_eq!(bay.output().planes(storage_bay::OUT).collect::<Vec<_>>(), vec![100]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StorageBay {
    buffer: DrainQueue,
}

impl StorageBay {
    /// Creates an empty bay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Planes currently held, front first.
    pub fn contents(&self) -> Vec<PlaneId> {
        self.buffer.contents()
    }

    /// Returns true if the bay holds no plane.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Model for StorageBay {
    fn kind(&self) -> &'static str {
        "StorageBay"
    }

    fn input_ports(&self) -> Vec<PortDesc> {
        vec![PortDesc::plane(IN)]
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
        for id in inputs.planes(IN) {
            self.buffer.push(id);
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
    use crate::model::ConfluentPolicy;

    fn arrivals(ids: &[PlaneId]) -> Bag {
        let mut bag = Bag::new();
        for &id in ids {
            bag.push(IN, Message::Plane(id));
        }
        bag
    }

    #[test]
    fn test_storage_bay_starts_passive() {
        let bay = StorageBay::new();
        assert!(bay.time_advance().is_infinite());
        assert!(bay.output().is_empty());
    }

    #[test]
    fn test_storage_bay_drains_one_per_instant() {
        let mut bay = StorageBay::new();
        bay.external_transition(10.0, 10.0, &arrivals(&[1, 2, 3]));

        let mut emitted = Vec::new();
        while bay.time_advance() == 0.0 {
            emitted.extend(bay.output().planes(OUT));
            bay.internal_transition(10.0);
        }

        assert_eq!(emitted, vec![1, 2, 3]);
        assert!(bay.is_empty());
        assert!(bay.time_advance().is_infinite());
    }

    #[test]
    fn test_storage_bay_confluent_keeps_order() {
        let mut bay = StorageBay::new();
        bay.external_transition(0.0, 0.0, &arrivals(&[1, 2]));

        // 1 is emitted while 3 arrives.
        bay.confluent_transition(0.0, &arrivals(&[3]), ConfluentPolicy::InternalFirst);
        assert_eq!(bay.contents(), vec![2, 3]);

        bay.confluent_transition(0.0, &arrivals(&[4]), ConfluentPolicy::ExternalFirst);
        assert_eq!(bay.contents(), vec![3, 4]);
    }

    #[test]
    fn test_storage_bay_state_rendering() {
        let mut bay = StorageBay::new();
        bay.external_transition(0.0, 0.0, &arrivals(&[7]));
        assert_eq!(bay.state(), "{phase=ACTIVE, size=1, sigma=0}");
    }
}
