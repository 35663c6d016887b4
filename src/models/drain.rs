//! Zero-latency drain buffer shared by the storage lanes.

use std::collections::VecDeque;

use crate::types::{PlaneId, SimTime, INFINITY};

/// A FIFO that releases one item per instant until it is empty.
///
/// The front item is offered on output and popped by the following internal
/// transition, so an item is never removed before it has been emitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DrainQueue {
    items: VecDeque<PlaneId>,
}

impl DrainQueue {
    pub fn push(&mut self, id: PlaneId) {
        self.items.push_back(id);
    }

    pub fn front(&self) -> Option<PlaneId> {
        self.items.front().copied()
    }

    /// Drops the item emitted at this instant.
    pub fn advance(&mut self) {
        self.items.pop_front();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contents(&self) -> Vec<PlaneId> {
        self.items.iter().copied().collect()
    }

    pub fn time_advance(&self) -> SimTime {
        if self.items.is_empty() {
            INFINITY
        } else {
            0.0
        }
    }

    pub fn render(&self) -> String {
        let phase = if self.is_empty() { "IDLE" } else { "ACTIVE" };
        format!(
            "{{phase={phase}, size={}, sigma={}}}",
            self.len(),
            self.time_advance()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_queue_discipline() {
        let mut queue = DrainQueue::default();
        assert!(queue.time_advance().is_infinite());

        queue.push(4);
        queue.push(9);
        assert_eq!(queue.time_advance(), 0.0);
        assert_eq!(queue.front(), Some(4));

        queue.advance();
        assert_eq!(queue.front(), Some(9));
        queue.advance();
        assert!(queue.is_empty());

        // Advancing an empty queue is harmless.
        queue.advance();
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_drain_queue_render() {
        let mut queue = DrainQueue::default();
        assert_eq!(queue.render(), "{phase=IDLE, size=0, sigma=inf}");
        queue.push(1);
        assert_eq!(queue.render(), "{phase=ACTIVE, size=1, sigma=0}");
    }
}
