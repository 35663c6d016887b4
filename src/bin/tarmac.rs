//! Tarmac CLI - Command-line runner
//!
//! Runs the airport, or a single registered model, from an event file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::info;

use tarmac::airport::{airport_top, IN_LANDING};
use tarmac::model::PortDesc;
use tarmac::{
    create_default_registry, AirportConfig, ConfigError, ConfluentPolicy, ConstructionError,
    CsvSink, ExternalEvent, EventSource, RegistryError, Simulation, SimulationError, SourceError,
    Timer,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Internal transition first, then external with zero elapsed time
    InternalFirst,
    /// External transition first, then internal
    ExternalFirst,
}

impl From<PolicyArg> for ConfluentPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::InternalFirst => ConfluentPolicy::InternalFirst,
            PolicyArg::ExternalFirst => ConfluentPolicy::ExternalFirst,
        }
    }
}

#[derive(Parser)]
#[command(name = "tarmac")]
#[command(about = "Discrete-event simulation of a single-runway airport", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the airport with `time plane_id` arrival lines
    Run {
        /// Arrival event file
        events: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },
    /// Drive one atomic model with `time port value` lines
    Atomic {
        /// Registered model type (queue, control_tower, runway, selector, storage_bay, merger)
        model: String,

        /// Event file
        events: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },
}

#[derive(Args)]
struct RunOpts {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Last simulation time to process (overrides the configuration)
    #[arg(long)]
    horizon: Option<f64>,

    /// Order of simultaneous internal and external events
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Write the message and state trace as CSV
    #[arg(long)]
    trace_csv: Option<PathBuf>,

    /// Write run statistics as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read events: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to build model: {0}")]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Failed to write '{path}': {error}")]
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    fn file_write(path: &Path, error: std::io::Error) -> Self {
        CliError::FileWrite {
            path: path.display().to_string(),
            error,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { events, opts } => run_airport(&events, &opts),
        Command::Atomic {
            model,
            events,
            opts,
        } => run_atomic(&model, &events, &opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration and applies command-line overrides.
fn load_config(opts: &RunOpts) -> Result<AirportConfig, CliError> {
    let mut config = match &opts.config {
        Some(path) => AirportConfig::from_file(path)?,
        None => AirportConfig::new(),
    };
    if let Some(horizon) = opts.horizon {
        config.simulation.horizon = horizon;
    }
    if let Some(policy) = opts.policy {
        config.simulation.confluent_policy = policy.into();
    }
    config.validate()?;

    tarmac::init_logging(&config.simulation.log_level);
    Ok(config)
}

fn run_airport(events: &Path, opts: &RunOpts) -> Result<(), CliError> {
    let config = load_config(opts)?;
    let arrivals = EventSource::single(PortDesc::plane(IN_LANDING)).read_file(events)?;
    let top = airport_top(&config.airport)?;

    simulate(Simulation::new(top), arrivals, &config, opts)
}

fn run_atomic(model: &str, events: &Path, opts: &RunOpts) -> Result<(), CliError> {
    let config = load_config(opts)?;
    let registry = create_default_registry();
    let harness = registry.harness(model, &config.airport)?;
    let inputs = registry
        .event_source(model, &config.airport)?
        .read_file(events)?;

    simulate(Simulation::new(harness), inputs, &config, opts)
}

fn simulate(
    sim: Simulation,
    inputs: Vec<ExternalEvent>,
    config: &AirportConfig,
    opts: &RunOpts,
) -> Result<(), CliError> {
    let mut sim = config.simulation.apply(sim).with_sink(tarmac::LogSink);
    if let Some(path) = &opts.trace_csv {
        let sink = CsvSink::create(path).map_err(|e| CliError::file_write(path, e))?;
        sim.add_sink(Box::new(sink));
    }

    info!(
        model = sim.name(),
        inputs = inputs.len(),
        horizon = config.simulation.horizon,
        policy = %config.simulation.confluent_policy,
        "Starting simulation"
    );
    sim.inject_all(inputs)?;

    let timer = Timer::start();
    let outcome = sim.run_until(config.simulation.horizon)?;
    let mut stats = sim.stats().clone();
    stats.compute_timing(timer.elapsed_ms());
    stats.metadata.config_file = opts.config.as_ref().map(|p| p.display().to_string());
    info!(?outcome, time = sim.clock(), "Simulation finished");

    for event in sim.outputs() {
        println!("{} {} {}", event.time, event.port, event.message);
    }
    println!();
    print!("{}", stats.summary());

    if let Some(path) = &opts.stats_json {
        stats
            .to_json_file(path)
            .map_err(|e| CliError::file_write(path, e))?;
    }
    Ok(())
}
