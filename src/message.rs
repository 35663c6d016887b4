//! Message definitions for the simulation framework.
//!
//! Messages are the only thing that travels along couplings. Each message has
//! a [`PortType`], and ports only accept messages of their own type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PlaneId, SimTime};

/// The type carried by a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Carries a plane identifier.
    Plane,
    /// Carries a payload-free control signal (stop/done handshake).
    Signal,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::Plane => f.write_str("plane"),
            PortType::Signal => f.write_str("signal"),
        }
    }
}

/// A message exchanged between models within one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    /// A plane identifier.
    Plane(PlaneId),
    /// A flow-control signal.
    Signal,
}

impl Message {
    /// Returns the port type this message may travel on.
    pub fn port_type(&self) -> PortType {
        match self {
            Message::Plane(_) => PortType::Plane,
            Message::Signal => PortType::Signal,
        }
    }

    /// Returns the plane identifier if this is a plane message.
    pub fn plane(&self) -> Option<PlaneId> {
        match self {
            Message::Plane(id) => Some(*id),
            Message::Signal => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Plane(id) => write!(f, "{id}"),
            // Signals carry no value; event files and traces use 1.
            Message::Signal => f.write_str("1"),
        }
    }
}

/// A timed message on a top-level port.
///
/// Injected events target a top-level input port and are delivered at
/// `time` together with any internal traffic of that instant. The kernel
/// reports top-level outputs with the same type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// The simulation time at which this input arrives
    pub time: SimTime,
    /// Name of the top-level input port
    pub port: String,
    /// The message delivered on that port
    pub message: Message,
}

impl ExternalEvent {
    /// Creates a new external event.
    pub fn new(time: SimTime, port: impl Into<String>, message: Message) -> Self {
        Self {
            time,
            port: port.into(),
            message,
        }
    }

    /// Creates a plane arrival on the given port.
    pub fn plane(time: SimTime, port: impl Into<String>, id: PlaneId) -> Self {
        Self::new(time, port, Message::Plane(id))
    }
}
