//! Model factory registry.
//!
//! The registry maps model type names to factories, together with the
//! numeric port selectors used by that model's event files. It lets any
//! atomic model be driven alone through a [`Coupled::harness`].
//!
//! # Example
//!
//! ```
//! use tarmac::airport::AirportParams;
//! use tarmac::registry::create_default_registry;
//!
//! let registry = create_default_registry();
//! let params = AirportParams::default();
//!
//! let harness = registry.harness("queue", &params).unwrap();
//! assert_eq!(harness.input_ports().len(), 3);
//!
//! let source = registry.event_source("queue", &params).unwrap();
//! let events = source.parse_str("0 0 12\n0 1 1\n").unwrap();
//! assert_eq!(events[1].port, "stop");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::airport::AirportParams;
use crate::coupled::{ConstructionError, Coupled};
use crate::model::Model;
use crate::models::{
    control_tower, merger, queue, runway, selector, storage_bay, ControlTower, Merger, Queue,
    Runway, Selector, StorageBay,
};
use crate::source::EventSource;

/// Type alias for model factory functions.
pub type ModelFactory = Arc<dyn Fn(&AirportParams) -> Box<dyn Model> + Send + Sync>;

/// Errors raised when instantiating registered models.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown model type `{0}`")]
    UnknownModel(String),

    #[error("Model `{model}` has no input port `{port}`")]
    UnknownPort { model: String, port: String },

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

struct Registration {
    factory: ModelFactory,
    /// Event file selector → input port name
    selectors: Vec<(i64, String)>,
}

/// A registry of atomic model factories.
#[derive(Default)]
pub struct ModelRegistry {
    entries: HashMap<String, Registration>,
}

impl ModelRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model factory and its event file selectors.
    ///
    /// # Arguments
    /// * `name` - The type name to register
    /// * `selectors` - Numeric selector and input port name pairs
    /// * `factory` - A function that creates model instances
    pub fn register<F, S>(&mut self, name: impl Into<String>, selectors: S, factory: F)
    where
        F: Fn(&AirportParams) -> Box<dyn Model> + Send + Sync + 'static,
        S: IntoIterator<Item = (i64, &'static str)>,
    {
        let selectors = selectors
            .into_iter()
            .map(|(sel, port)| (sel, port.to_string()))
            .collect();
        self.entries.insert(
            name.into(),
            Registration {
                factory: Arc::new(factory),
                selectors,
            },
        );
    }

    /// Creates a model instance by type name.
    pub fn create(&self, type_name: &str, params: &AirportParams) -> Option<Box<dyn Model>> {
        self.entries.get(type_name).map(|e| (e.factory)(params))
    }

    /// Wraps a new instance of `type_name` in a harness exposing all its ports.
    pub fn harness(&self, type_name: &str, params: &AirportParams) -> Result<Coupled, RegistryError> {
        let model = self
            .create(type_name, params)
            .ok_or_else(|| RegistryError::UnknownModel(type_name.to_string()))?;
        Ok(Coupled::harness(type_name, model)?)
    }

    /// Event file parser for `type_name`, built from its selectors and port types.
    pub fn event_source(&self, type_name: &str, params: &AirportParams) -> Result<EventSource, RegistryError> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownModel(type_name.to_string()))?;
        let inputs = (entry.factory)(params).input_ports();

        let mut ports = Vec::with_capacity(entry.selectors.len());
        for (selector, name) in &entry.selectors {
            let desc = inputs
                .iter()
                .find(|p| &p.name == name)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownPort {
                    model: type_name.to_string(),
                    port: name.clone(),
                })?;
            ports.push((*selector, desc));
        }

        Ok(EventSource::selected(ports))
    }

    /// Returns true if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("registered_types", &self.type_names())
            .finish()
    }
}

/// Creates a registry with the airport's atomic models.
///
/// Includes `queue`, `control_tower`, `runway`, `selector`, `storage_bay`
/// and `merger`.
pub fn create_default_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();

    registry.register(
        "queue",
        [(0, queue::IN), (1, queue::STOP), (2, queue::DONE)],
        |_| Box::new(Queue::new()),
    );
    registry.register(
        "control_tower",
        [(0, control_tower::IN_LANDING), (1, control_tower::IN_TAKEOFF)],
        |p| Box::new(ControlTower::new().with_runway_time(p.runway_time)),
    );
    registry.register(
        "runway",
        [(0, runway::LAND), (1, runway::TAKEOFF)],
        |p| Box::new(Runway::new().with_operation_time(p.runway_time)),
    );
    registry.register("selector", [(0, selector::IN)], |p| {
        Box::new(
            Selector::new()
                .with_routing_time(p.routing_time)
                .with_limits(p.bay_limits),
        )
    });
    registry.register("storage_bay", [(0, storage_bay::IN)], |_| {
        Box::new(StorageBay::new())
    });
    registry.register(
        "merger",
        [
            (1, merger::IN1),
            (2, merger::IN2),
            (3, merger::IN3),
            (4, merger::IN4),
        ],
        |_| Box::new(Merger::new()),
    );

    registry
}
