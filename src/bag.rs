//! Per-instant message bags.
//!
//! A [`Bag`] groups the messages a model emits or receives during a single
//! instant, keyed by port name. Bags are built fresh every instant and are
//! never shared between models.

use std::collections::BTreeMap;

use crate::message::Message;
use crate::types::PlaneId;

/// Messages grouped by port for one instant.
///
/// Messages on the same port keep their insertion order. Ports are iterated
/// in name order, which keeps traces deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bag {
    ports: BTreeMap<String, Vec<Message>>,
}

impl Bag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to `port`.
    pub fn push(&mut self, port: impl Into<String>, message: Message) {
        self.ports.entry(port.into()).or_default().push(message);
    }

    /// Builder-style variant of [`Bag::push`].
    pub fn with(mut self, port: impl Into<String>, message: Message) -> Self {
        self.push(port, message);
        self
    }

    /// Messages received on `port`, in arrival order.
    pub fn get(&self, port: &str) -> &[Message] {
        self.ports.get(port).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Plane identifiers received on `port`, in arrival order.
    ///
    /// Signals on the port are skipped; ports are type-checked at
    /// construction so this only happens for mis-declared models.
    pub fn planes<'a>(&'a self, port: &str) -> impl Iterator<Item = PlaneId> + 'a {
        self.get(port).iter().filter_map(Message::plane)
    }

    /// Returns true if at least one message arrived on `port`.
    pub fn has(&self, port: &str) -> bool {
        !self.get(port).is_empty()
    }

    /// Returns true if the bag holds no message at all.
    pub fn is_empty(&self) -> bool {
        self.ports.values().all(Vec::is_empty)
    }

    /// Total number of messages across all ports.
    pub fn len(&self) -> usize {
        self.ports.values().map(Vec::len).sum()
    }

    /// Iterates over `(port, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.ports
            .iter()
            .flat_map(|(port, messages)| messages.iter().map(move |m| (port.as_str(), m)))
    }
}
