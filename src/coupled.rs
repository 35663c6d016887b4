//! Coupled model definitions.
//!
//! A coupled model is a named composition of atomic models and other coupled
//! models, with its own boundary ports and a set of couplings. Couplings are
//! validated as they are added, so a malformed graph is rejected before any
//! simulation starts. Before running, the hierarchy is flattened into a list
//! of atomic models and a [`RoutingTable`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::coupling::{AtomicPort, Coupling, CouplingKind, Endpoint, RoutingTable, Target};
use crate::message::PortType;
use crate::model::{Model, PortDesc};
use crate::types::ModelId;

/// Port direction, used in error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Errors detected while building a coupled model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Invalid component name `{0}` (names must be non-empty and contain no '.')")]
    InvalidName(String),

    #[error("Duplicate component `{component}` in `{coupled}`")]
    DuplicateComponent { coupled: String, component: String },

    #[error("Duplicate {direction} port `{port}` on `{coupled}`")]
    DuplicatePort {
        coupled: String,
        port: String,
        direction: Direction,
    },

    #[error("Unknown component `{component}` in `{coupled}`")]
    UnknownComponent { coupled: String, component: String },

    #[error("`{endpoint}` is not an {direction} port in `{coupled}`")]
    UnknownPort {
        coupled: String,
        endpoint: String,
        direction: Direction,
    },

    #[error("Coupling `{coupling}` in `{coupled}` links two boundary ports")]
    BoundaryPassthrough { coupled: String, coupling: String },

    #[error("Type mismatch on `{coupling}` in `{coupled}`: {src} -> {dst}")]
    TypeMismatch {
        coupled: String,
        coupling: String,
        src: PortType,
        dst: PortType,
    },

    #[error("Duplicate coupling `{coupling}` in `{coupled}`")]
    DuplicateCoupling { coupled: String, coupling: String },
}

/// Result type for construction operations.
pub type ConstructionResult<T> = Result<T, ConstructionError>;

/// A child of a coupled model.
pub enum Component {
    Atomic(Box<dyn Model>),
    Coupled(Coupled),
}

impl Component {
    fn input_ports(&self) -> Vec<PortDesc> {
        match self {
            Component::Atomic(model) => model.input_ports(),
            Component::Coupled(coupled) => coupled.inputs.clone(),
        }
    }

    fn output_ports(&self) -> Vec<PortDesc> {
        match self {
            Component::Atomic(model) => model.output_ports(),
            Component::Coupled(coupled) => coupled.outputs.clone(),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Atomic(model) => write!(f, "Atomic({})", model.kind()),
            Component::Coupled(coupled) => write!(f, "Coupled({})", coupled.name),
        }
    }
}

/// An atomic model extracted from a hierarchy, with its dotted path.
pub struct Atom {
    pub path: String,
    pub model: Box<dyn Model>,
}

/// A composition of components with boundary ports and couplings.
///
/// # Example
///
/// ```
/// use tarmac::coupled::Coupled;
/// use tarmac::model::PortDesc;
/// use tarmac::models::StorageBay;
///
/// let mut lane = Coupled::new("Lane");
/// lane.add_input(PortDesc::plane("in")).unwrap();
/// lane.add_output(PortDesc::plane("out")).unwrap();
/// lane.add_atomic("Bay", StorageBay::new()).unwrap();
/// lane.forward_input("in", "Bay", "in").unwrap();
/// lane.forward_output("Bay", "out", "out").unwrap();
///
/// assert_eq!(lane.component_count(), 1);
/// assert_eq!(lane.coupling_count(), 2);
/// ```
#[derive(Debug)]
pub struct Coupled {
    name: String,
    inputs: Vec<PortDesc>,
    outputs: Vec<PortDesc>,
    components: Vec<(String, Component)>,
    index: HashMap<String, usize>,
    couplings: Vec<Coupling>,
}

impl Coupled {
    /// Creates an empty coupled model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            components: Vec::new(),
            index: HashMap::new(),
            couplings: Vec::new(),
        }
    }

    /// Wraps a single atomic model, exposing each of its ports on the boundary
    /// under the same name.
    pub fn harness(name: impl Into<String>, model: Box<dyn Model>) -> ConstructionResult<Self> {
        let mut harness = Self::new(name);
        let component = model.kind().to_string();
        let inputs = model.input_ports();
        let outputs = model.output_ports();
        harness.add_boxed(component.clone(), model)?;

        for port in inputs {
            harness.add_input(port.clone())?;
            harness.forward_input(port.name.clone(), component.clone(), port.name)?;
        }
        for port in outputs {
            harness.add_output(port.clone())?;
            harness.forward_output(component.clone(), port.name.clone(), port.name)?;
        }

        Ok(harness)
    }

    /// Returns the model's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boundary input ports.
    pub fn input_ports(&self) -> &[PortDesc] {
        &self.inputs
    }

    /// Boundary output ports.
    pub fn output_ports(&self) -> &[PortDesc] {
        &self.outputs
    }

    /// Number of direct components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of couplings declared at this level.
    pub fn coupling_count(&self) -> usize {
        self.couplings.len()
    }

    /// Couplings declared at this level, in insertion order.
    pub fn couplings(&self) -> &[Coupling] {
        &self.couplings
    }

    /// Names of the direct components, in insertion order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(name, _)| name.as_str())
    }

    /// Declares a boundary input port.
    pub fn add_input(&mut self, port: PortDesc) -> ConstructionResult<()> {
        if self.inputs.iter().any(|p| p.name == port.name) {
            return Err(ConstructionError::DuplicatePort {
                coupled: self.name.clone(),
                port: port.name,
                direction: Direction::Input,
            });
        }
        self.inputs.push(port);
        Ok(())
    }

    /// Declares a boundary output port.
    pub fn add_output(&mut self, port: PortDesc) -> ConstructionResult<()> {
        if self.outputs.iter().any(|p| p.name == port.name) {
            return Err(ConstructionError::DuplicatePort {
                coupled: self.name.clone(),
                port: port.name,
                direction: Direction::Output,
            });
        }
        self.outputs.push(port);
        Ok(())
    }

    /// Adds an atomic component.
    pub fn add_atomic<M: Model + 'static>(
        &mut self,
        name: impl Into<String>,
        model: M,
    ) -> ConstructionResult<()> {
        self.add_boxed(name, Box::new(model))
    }

    /// Adds an already boxed atomic component.
    pub fn add_boxed(&mut self, name: impl Into<String>, model: Box<dyn Model>) -> ConstructionResult<()> {
        self.add_component(name.into(), Component::Atomic(model))
    }

    /// Adds a coupled component under its own name.
    pub fn add_coupled(&mut self, coupled: Coupled) -> ConstructionResult<()> {
        let name = coupled.name.clone();
        self.add_component(name, Component::Coupled(coupled))
    }

    fn add_component(&mut self, name: String, component: Component) -> ConstructionResult<()> {
        if name.is_empty() || name.contains('.') {
            return Err(ConstructionError::InvalidName(name));
        }
        if self.index.contains_key(&name) {
            return Err(ConstructionError::DuplicateComponent {
                coupled: self.name.clone(),
                component: name,
            });
        }
        self.index.insert(name.clone(), self.components.len());
        self.components.push((name, component));
        Ok(())
    }

    /// Adds a validated coupling.
    pub fn couple(&mut self, src: Endpoint, dst: Endpoint) -> ConstructionResult<()> {
        let coupling = Coupling::new(src, dst);

        if coupling.kind().is_none() {
            return Err(ConstructionError::BoundaryPassthrough {
                coupled: self.name.clone(),
                coupling: coupling.to_string(),
            });
        }

        let src_ty = self.port_type(&coupling.src, Direction::Output)?;
        let dst_ty = self.port_type(&coupling.dst, Direction::Input)?;
        if src_ty != dst_ty {
            return Err(ConstructionError::TypeMismatch {
                coupled: self.name.clone(),
                coupling: coupling.to_string(),
                src: src_ty,
                dst: dst_ty,
            });
        }

        if self.couplings.contains(&coupling) {
            return Err(ConstructionError::DuplicateCoupling {
                coupled: self.name.clone(),
                coupling: coupling.to_string(),
            });
        }

        self.couplings.push(coupling);
        Ok(())
    }

    /// Internal coupling shorthand: `src.src_port -> dst.dst_port`.
    pub fn connect(
        &mut self,
        src: impl Into<String>,
        src_port: impl Into<String>,
        dst: impl Into<String>,
        dst_port: impl Into<String>,
    ) -> ConstructionResult<()> {
        self.couple(
            Endpoint::component(src, src_port),
            Endpoint::component(dst, dst_port),
        )
    }

    /// External input coupling shorthand: `port -> dst.dst_port`.
    pub fn forward_input(
        &mut self,
        port: impl Into<String>,
        dst: impl Into<String>,
        dst_port: impl Into<String>,
    ) -> ConstructionResult<()> {
        self.couple(Endpoint::boundary(port), Endpoint::component(dst, dst_port))
    }

    /// External output coupling shorthand: `src.src_port -> port`.
    pub fn forward_output(
        &mut self,
        src: impl Into<String>,
        src_port: impl Into<String>,
        port: impl Into<String>,
    ) -> ConstructionResult<()> {
        self.couple(Endpoint::component(src, src_port), Endpoint::boundary(port))
    }

    /// Resolves the type of an endpoint used as a source (`Output`) or a
    /// destination (`Input`) of a coupling.
    ///
    /// A boundary input acts as a source and a boundary output as a
    /// destination, so the boundary direction is the opposite of `role`.
    fn port_type(&self, endpoint: &Endpoint, role: Direction) -> ConstructionResult<PortType> {
        let (ports, direction) = match endpoint {
            Endpoint::Boundary { .. } => match role {
                Direction::Output => (self.inputs.clone(), Direction::Input),
                Direction::Input => (self.outputs.clone(), Direction::Output),
            },
            Endpoint::Component { component, .. } => {
                let idx = self.index.get(component).ok_or_else(|| {
                    ConstructionError::UnknownComponent {
                        coupled: self.name.clone(),
                        component: component.clone(),
                    }
                })?;
                let child = &self.components[*idx].1;
                match role {
                    Direction::Output => (child.output_ports(), Direction::Output),
                    Direction::Input => (child.input_ports(), Direction::Input),
                }
            }
        };

        ports
            .iter()
            .find(|p| p.name == endpoint.port())
            .map(|p| p.ty)
            .ok_or_else(|| ConstructionError::UnknownPort {
                coupled: self.name.clone(),
                endpoint: endpoint.to_string(),
                direction,
            })
    }

    /// Flattens the hierarchy into atomic models and a routing table.
    ///
    /// Atomic models are numbered depth-first in component insertion order
    /// and named by their dotted path from this model (e.g.
    /// `Airport.Hangar.Selector`).
    pub fn flatten(self) -> (Vec<Atom>, RoutingTable) {
        let mut atoms = Vec::new();
        let mut table = RoutingTable::new(self.inputs.clone(), self.outputs.clone());
        let prefix = self.name.clone();

        let interface = self.flatten_into(&prefix, &mut atoms, &mut table);

        for (port, dsts) in interface.inputs {
            for dst in dsts {
                table.add_input(port.clone(), dst);
            }
        }
        for (port, srcs) in interface.outputs {
            for src in srcs {
                table.add_route(&src, Target::Output(port.clone()));
            }
        }

        (atoms, table)
    }

    fn flatten_into(self, prefix: &str, atoms: &mut Vec<Atom>, table: &mut RoutingTable) -> Interface {
        let mut resolved: HashMap<String, Resolved> = HashMap::new();

        for (name, component) in self.components {
            let path = format!("{prefix}.{name}");
            match component {
                Component::Atomic(model) => {
                    let id: ModelId = atoms.len();
                    atoms.push(Atom { path, model });
                    resolved.insert(name, Resolved::Atomic(id));
                }
                Component::Coupled(child) => {
                    let interface = child.flatten_into(&path, atoms, table);
                    resolved.insert(name, Resolved::Coupled(interface));
                }
            }
        }

        let mut interface = Interface::default();
        for coupling in &self.couplings {
            let srcs = match &coupling.src {
                Endpoint::Boundary { .. } => None,
                Endpoint::Component { component, port } => {
                    resolved.get(component).map(|r| r.sources(port))
                }
            };
            let dsts = match &coupling.dst {
                Endpoint::Boundary { .. } => None,
                Endpoint::Component { component, port } => {
                    resolved.get(component).map(|r| r.destinations(port))
                }
            };

            match coupling.kind() {
                Some(CouplingKind::Internal) => {
                    let (srcs, dsts) = (srcs.unwrap_or_default(), dsts.unwrap_or_default());
                    for src in &srcs {
                        for dst in &dsts {
                            table.add_route(src, Target::Model(dst.clone()));
                        }
                    }
                }
                Some(CouplingKind::ExternalInput) => {
                    interface
                        .inputs
                        .entry(coupling.src.port().to_string())
                        .or_default()
                        .extend(dsts.unwrap_or_default());
                }
                Some(CouplingKind::ExternalOutput) => {
                    interface
                        .outputs
                        .entry(coupling.dst.port().to_string())
                        .or_default()
                        .extend(srcs.unwrap_or_default());
                }
                None => {}
            }
        }

        interface
    }
}

/// Atomic ports reachable through a coupled model's boundary.
#[derive(Default)]
struct Interface {
    /// Boundary input → atomic input ports it feeds
    inputs: BTreeMap<String, Vec<AtomicPort>>,
    /// Boundary output → atomic output ports feeding it
    outputs: BTreeMap<String, Vec<AtomicPort>>,
}

enum Resolved {
    Atomic(ModelId),
    Coupled(Interface),
}

impl Resolved {
    fn sources(&self, port: &str) -> Vec<AtomicPort> {
        match self {
            Resolved::Atomic(id) => vec![AtomicPort::new(*id, port)],
            Resolved::Coupled(interface) => interface.outputs.get(port).cloned().unwrap_or_default(),
        }
    }

    fn destinations(&self, port: &str) -> Vec<AtomicPort> {
        match self {
            Resolved::Atomic(id) => vec![AtomicPort::new(*id, port)],
            Resolved::Coupled(interface) => interface.inputs.get(port).cloned().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Merger, Queue, StorageBay};

    fn lane(name: &str) -> Coupled {
        let mut lane = Coupled::new(name);
        lane.add_input(PortDesc::plane("in")).unwrap();
        lane.add_output(PortDesc::plane("out")).unwrap();
        lane.add_atomic("Bay", StorageBay::new()).unwrap();
        lane.forward_input("in", "Bay", "in").unwrap();
        lane.forward_output("Bay", "out", "out").unwrap();
        lane
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let mut top = Coupled::new("Top");
        top.add_atomic("Bay", StorageBay::new()).unwrap();
        let err = top.add_atomic("Bay", StorageBay::new()).unwrap_err();

        assert!(matches!(err, ConstructionError::DuplicateComponent { .. }));
    }

    #[test]
    fn test_invalid_component_name() {
        let mut top = Coupled::new("Top");
        let err = top.add_atomic("a.b", StorageBay::new()).unwrap_err();
        assert_eq!(err, ConstructionError::InvalidName("a.b".to_string()));
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let mut top = Coupled::new("Top");
        top.add_input(PortDesc::plane("in")).unwrap();
        assert!(top.add_input(PortDesc::signal("in")).is_err());
        // Same name on the other side is fine.
        assert!(top.add_output(PortDesc::plane("in")).is_ok());
    }

    #[test]
    fn test_unknown_component_rejected() {
        let mut top = Coupled::new("Top");
        top.add_atomic("Bay", StorageBay::new()).unwrap();
        let err = top.connect("Bay", "out", "Ghost", "in").unwrap_err();

        assert_eq!(
            err,
            ConstructionError::UnknownComponent {
                coupled: "Top".to_string(),
                component: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_dangling_port_rejected() {
        let mut top = Coupled::new("Top");
        top.add_atomic("Bay", StorageBay::new()).unwrap();
        top.add_atomic("Merger", Merger::new()).unwrap();

        let err = top.connect("Bay", "out", "Merger", "in9").unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::UnknownPort { direction: Direction::Input, .. }
        ));

        // An input port cannot be used as a coupling source.
        let err = top.connect("Bay", "in", "Merger", "in1").unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::UnknownPort { direction: Direction::Output, .. }
        ));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut top = Coupled::new("Top");
        top.add_atomic("Bay", StorageBay::new()).unwrap();
        top.add_atomic("Queue", Queue::new()).unwrap();

        let err = top.connect("Bay", "out", "Queue", "stop").unwrap_err();
        assert_eq!(
            err,
            ConstructionError::TypeMismatch {
                coupled: "Top".to_string(),
                coupling: "Bay.out -> Queue.stop".to_string(),
                src: PortType::Plane,
                dst: PortType::Signal,
            }
        );
    }

    #[test]
    fn test_boundary_passthrough_rejected() {
        let mut top = Coupled::new("Top");
        top.add_input(PortDesc::plane("in")).unwrap();
        top.add_output(PortDesc::plane("out")).unwrap();

        let err = top
            .couple(Endpoint::boundary("in"), Endpoint::boundary("out"))
            .unwrap_err();
        assert!(matches!(err, ConstructionError::BoundaryPassthrough { .. }));
    }

    #[test]
    fn test_duplicate_coupling_rejected() {
        let mut top = Coupled::new("Top");
        top.add_atomic("Bay", StorageBay::new()).unwrap();
        top.add_atomic("Merger", Merger::new()).unwrap();
        top.connect("Bay", "out", "Merger", "in1").unwrap();

        let err = top.connect("Bay", "out", "Merger", "in1").unwrap_err();
        assert!(matches!(err, ConstructionError::DuplicateCoupling { .. }));
    }

    #[test]
    fn test_flatten_resolves_through_hierarchy() {
        let mut top = Coupled::new("Top");
        top.add_input(PortDesc::plane("in")).unwrap();
        top.add_output(PortDesc::plane("out")).unwrap();
        top.add_coupled(lane("A")).unwrap();
        top.add_coupled(lane("B")).unwrap();
        top.forward_input("in", "A", "in").unwrap();
        top.connect("A", "out", "B", "in").unwrap();
        top.forward_output("B", "out", "out").unwrap();

        let (atoms, table) = top.flatten();
        let paths: Vec<_> = atoms.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["Top.A.Bay", "Top.B.Bay"]);

        assert_eq!(table.input_targets("in"), &[AtomicPort::new(0, "in")]);
        assert_eq!(table.targets(0, "out"), &[Target::Model(AtomicPort::new(1, "in"))]);
        assert_eq!(table.targets(1, "out"), &[Target::Output("out".to_string())]);
    }

    #[test]
    fn test_flatten_fan_out_and_fan_in() {
        let mut top = Coupled::new("Top");
        top.add_input(PortDesc::plane("in")).unwrap();
        top.add_output(PortDesc::plane("out")).unwrap();
        top.add_atomic("Left", StorageBay::new()).unwrap();
        top.add_atomic("Right", StorageBay::new()).unwrap();
        top.add_atomic("Merger", Merger::new()).unwrap();
        top.forward_input("in", "Left", "in").unwrap();
        top.forward_input("in", "Right", "in").unwrap();
        top.connect("Left", "out", "Merger", "in1").unwrap();
        top.connect("Right", "out", "Merger", "in1").unwrap();
        top.forward_output("Merger", "out", "out").unwrap();

        let (_, table) = top.flatten();
        assert_eq!(
            table.input_targets("in"),
            &[AtomicPort::new(0, "in"), AtomicPort::new(1, "in")]
        );
        assert_eq!(table.targets(0, "out"), &[Target::Model(AtomicPort::new(2, "in1"))]);
        assert_eq!(table.targets(1, "out"), &[Target::Model(AtomicPort::new(2, "in1"))]);
    }

    #[test]
    fn test_harness_exposes_all_ports() {
        let harness = Coupled::harness("Harness", Box::new(Queue::new())).unwrap();

        let inputs: Vec<_> = harness.input_ports().iter().map(|p| p.name.as_str()).collect();
        let outputs: Vec<_> = harness.output_ports().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(inputs, vec!["in", "stop", "done"]);
        assert_eq!(outputs, vec!["out"]);
        assert_eq!(harness.coupling_count(), 4);
    }
}
