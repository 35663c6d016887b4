//! Coupling definitions and the flattened routing table.
//!
//! Couplings connect ports and define where each emitted message goes. Inside
//! a coupled model a coupling is one of three kinds:
//!
//! - **EIC** (external input coupling): boundary input → component input
//! - **IC** (internal coupling): component output → component input
//! - **EOC** (external output coupling): component output → boundary output
//!
//! Before simulation the hierarchy is flattened into a [`RoutingTable`] that
//! maps every atomic output port directly to its atomic destinations.
//!
//! # Example
//!
//! ```
//! use tarmac::coupling::{Coupling, CouplingKind, Endpoint};
//!
//! let c = Coupling::new(Endpoint::boundary("in"), Endpoint::component("Selector", "in"));
//! assert_eq!(c.kind(), Some(CouplingKind::ExternalInput));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::PortDesc;
use crate::types::ModelId;

/// One end of a coupling inside a coupled model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// A port on the coupled model's own boundary.
    Boundary { port: String },
    /// A port on one of the coupled model's components.
    Component { component: String, port: String },
}

impl Endpoint {
    /// A boundary port of the enclosing coupled model.
    pub fn boundary(port: impl Into<String>) -> Self {
        Endpoint::Boundary { port: port.into() }
    }

    /// A port on a named component.
    pub fn component(component: impl Into<String>, port: impl Into<String>) -> Self {
        Endpoint::Component {
            component: component.into(),
            port: port.into(),
        }
    }

    /// The port name, regardless of where it lives.
    pub fn port(&self) -> &str {
        match self {
            Endpoint::Boundary { port } | Endpoint::Component { port, .. } => port,
        }
    }

    /// Returns true if this endpoint is on the enclosing boundary.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Endpoint::Boundary { .. })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Boundary { port } => write!(f, "<boundary>.{port}"),
            Endpoint::Component { component, port } => write!(f, "{component}.{port}"),
        }
    }
}

/// The role a coupling plays inside its coupled model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CouplingKind {
    ExternalInput,
    Internal,
    ExternalOutput,
}

/// A directed wire between two endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupling {
    /// Where messages are taken from
    pub src: Endpoint,
    /// Where messages are delivered
    pub dst: Endpoint,
}

impl Coupling {
    /// Creates a new coupling.
    pub fn new(src: Endpoint, dst: Endpoint) -> Self {
        Self { src, dst }
    }

    /// Classifies the coupling, or `None` for a boundary-to-boundary wire.
    pub fn kind(&self) -> Option<CouplingKind> {
        match (self.src.is_boundary(), self.dst.is_boundary()) {
            (true, false) => Some(CouplingKind::ExternalInput),
            (false, false) => Some(CouplingKind::Internal),
            (false, true) => Some(CouplingKind::ExternalOutput),
            (true, true) => None,
        }
    }
}

impl fmt::Display for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// An atomic model port in a flattened simulation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtomicPort {
    pub model: ModelId,
    pub port: String,
}

impl AtomicPort {
    pub fn new(model: ModelId, port: impl Into<String>) -> Self {
        Self {
            model,
            port: port.into(),
        }
    }
}

/// Where a message emitted by an atomic model ends up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// An input port of another atomic model.
    Model(AtomicPort),
    /// An output port of the top-level model.
    Output(String),
}

/// Flattened couplings of a whole simulation.
///
/// Fan-out keeps coupling insertion order, so a message emitted on one port
/// reaches its destinations in the order the couplings were declared.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    routes: HashMap<(ModelId, String), Vec<Target>>,
    inputs: HashMap<String, Vec<AtomicPort>>,
    input_ports: Vec<PortDesc>,
    output_ports: Vec<PortDesc>,
}

impl RoutingTable {
    /// Creates an empty table for a top-level model with the given boundary.
    pub fn new(input_ports: Vec<PortDesc>, output_ports: Vec<PortDesc>) -> Self {
        Self {
            input_ports,
            output_ports,
            ..Self::default()
        }
    }

    /// Adds a route from an atomic output port.
    pub fn add_route(&mut self, src: &AtomicPort, target: Target) {
        self.routes
            .entry((src.model, src.port.clone()))
            .or_default()
            .push(target);
    }

    /// Adds a destination for a top-level input port.
    pub fn add_input(&mut self, port: impl Into<String>, dst: AtomicPort) {
        self.inputs.entry(port.into()).or_default().push(dst);
    }

    /// Destinations of a message emitted on `(model, port)`.
    pub fn targets(&self, model: ModelId, port: &str) -> &[Target] {
        self.routes
            .get(&(model, port.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Atomic destinations of a top-level input port.
    pub fn input_targets(&self, port: &str) -> &[AtomicPort] {
        self.inputs.get(port).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Boundary input ports of the top-level model.
    pub fn input_ports(&self) -> &[PortDesc] {
        &self.input_ports
    }

    /// Boundary output ports of the top-level model.
    pub fn output_ports(&self) -> &[PortDesc] {
        &self.output_ports
    }

    /// Looks up a top-level input port by name.
    pub fn input_port(&self, name: &str) -> Option<&PortDesc> {
        self.input_ports.iter().find(|p| p.name == name)
    }

    /// Total number of atomic-to-target routes.
    pub fn route_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }
}
