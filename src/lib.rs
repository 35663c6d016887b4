//! # Tarmac
//!
//! A discrete-event (DEVS) simulation of ground operations at a
//! single-runway airport.
//!
//! ## Design Principles
//!
//! - **Atomic models**: each component is a timed state machine with a time
//!   advance, internal, external and confluent transitions, and an output
//!   function ([`Model`]).
//! - **Hierarchical coupling**: models are composed into [`Coupled`] models
//!   whose couplings are validated at construction and flattened into one
//!   routing table before simulation.
//! - **Logical clock**: the [`Simulation`] kernel jumps between event times.
//!   Zero-duration cascades run as extra steps at the same instant.
//!
//! ## Quick Start
//!
//! ```rust
//! use tarmac::airport::{airport_top, AirportParams, IN_LANDING};
//! use tarmac::{Message, RecordingSink, Simulation};
//!
//! let top = airport_top(&AirportParams::default()).unwrap();
//! let trace = RecordingSink::new();
//! let mut sim = Simulation::new(top).with_sink(trace.clone());
//!
//! sim.inject(0.0, IN_LANDING, Message::Plane(100)).unwrap();
//! sim.inject(10.0, IN_LANDING, Message::Plane(600)).unwrap();
//! sim.run().unwrap();
//!
//! assert_eq!(sim.outputs().len(), 2);
//! assert!(!trace.messages("Airport.Runway", "landing_exit").is_empty());
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use tarmac::config::AirportConfig;
//!
//! let config = AirportConfig::from_yaml_file("airport.yaml")?;
//! let top = tarmac::airport::airport_top(&config.airport)?;
//! let mut sim = config.simulation.apply(Simulation::new(top));
//! sim.run_until(config.simulation.horizon)?;
//! ```

pub mod types;
pub mod message;
pub mod bag;
pub mod model;
pub mod coupling;
pub mod coupled;
pub mod kernel;
pub mod trace;
pub mod stats;
pub mod config;
pub mod source;
pub mod registry;
pub mod models;
pub mod airport;

// Re-export commonly used types
pub use types::{ModelId, PlaneId, SimTime, INFINITY};
pub use message::{ExternalEvent, Message, PortType};
pub use bag::Bag;
pub use model::{ConfluentPolicy, Model, PortDesc, Transition};
pub use coupling::{Coupling, Endpoint, RoutingTable};
pub use coupled::{ConstructionError, Coupled};
pub use kernel::{RunOutcome, Simulation, SimulationError};
pub use trace::{CsvSink, LogSink, RecordingSink, TraceRecord, TraceSink};
pub use stats::{SimulationStats, Timer};
pub use config::{AirportConfig, AirportConfigBuilder, ConfigError};
pub use source::{EventSource, SourceError};
pub use registry::{create_default_registry, ModelRegistry, RegistryError};
pub use airport::AirportParams;

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// tarmac::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
