//! Statistics collection and export for the simulation kernel.
//!
//! This module provides run counters kept by the kernel and multiple export
//! formats (JSON, CSV, summary text) for analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::model::Transition;
use crate::types::{ModelId, SimTime};

/// Aggregate statistics for a simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Simulation metadata
    pub metadata: SimulationMetadata,

    /// Kernel-level counters
    pub kernel: KernelStats,

    /// Per-model counters, keyed by model path
    pub models: BTreeMap<String, ModelStats>,

    /// Timing statistics
    pub timing: TimingStats,
}

/// Metadata about the simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationMetadata {
    /// Simulation name/description
    pub name: String,

    /// Start time (wall clock)
    pub start_time: Option<String>,

    /// End time (wall clock)
    pub end_time: Option<String>,

    /// Crate version
    pub version: String,

    /// Configuration file used (if any)
    pub config_file: Option<String>,
}

/// Kernel-level counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KernelStats {
    /// Clock value after the last step
    pub final_time: SimTime,

    /// Total steps executed, zero-time cascades included
    pub steps_executed: u64,

    /// Distinct clock values visited
    pub instants: u64,

    /// Longest run of steps at a single instant
    pub longest_cascade: u64,

    pub internal_transitions: u64,
    pub external_transitions: u64,
    pub confluent_transitions: u64,

    /// Messages produced by model output functions
    pub messages_emitted: u64,

    /// Messages placed into a model's input bag
    pub messages_delivered: u64,

    /// Messages emitted on ports with no coupling
    pub messages_unrouted: u64,

    /// External inputs consumed
    pub external_inputs: u64,

    /// Messages that reached a top-level output port
    pub boundary_outputs: u64,

    /// Number of atomic models
    pub model_count: usize,

    /// Number of flattened routes
    pub route_count: usize,
}

/// Counters for a single atomic model.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelStats {
    /// Flattened model index
    pub id: ModelId,

    /// Model type name
    pub kind: String,

    pub internal_transitions: u64,
    pub external_transitions: u64,
    pub confluent_transitions: u64,

    /// Messages this model emitted
    pub messages_emitted: u64,

    /// Messages delivered to this model
    pub messages_received: u64,
}

impl ModelStats {
    pub fn new(id: ModelId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Total transitions of any kind.
    pub fn transitions(&self) -> u64 {
        self.internal_transitions + self.external_transitions + self.confluent_transitions
    }
}

/// Timing/performance statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingStats {
    /// Total wall-clock time in milliseconds
    pub total_wall_time_ms: f64,

    /// Simulation time per wall-clock second
    pub sim_time_per_second: f64,

    /// Steps executed per second
    pub steps_per_second: f64,
}

impl SimulationStats {
    /// Creates a new empty statistics container.
    pub fn new() -> Self {
        Self {
            metadata: SimulationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..SimulationMetadata::default()
            },
            ..Self::default()
        }
    }

    /// Sets the simulation name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    /// Records the start time.
    pub fn record_start(&mut self) {
        self.metadata.start_time = Some(unix_now());
    }

    /// Records the end time.
    pub fn record_end(&mut self) {
        self.metadata.end_time = Some(unix_now());
    }

    /// Counts one transition of `model`.
    pub fn record_transition(&mut self, model: &str, transition: Transition) {
        let entry = self.models.entry(model.to_string()).or_default();
        match transition {
            Transition::Internal => {
                self.kernel.internal_transitions += 1;
                entry.internal_transitions += 1;
            }
            Transition::External => {
                self.kernel.external_transitions += 1;
                entry.external_transitions += 1;
            }
            Transition::Confluent => {
                self.kernel.confluent_transitions += 1;
                entry.confluent_transitions += 1;
            }
        }
    }

    /// Total transitions of any kind.
    pub fn transitions(&self) -> u64 {
        self.kernel.internal_transitions
            + self.kernel.external_transitions
            + self.kernel.confluent_transitions
    }

    /// Updates timing statistics based on wall clock time.
    pub fn compute_timing(&mut self, wall_time_ms: f64) {
        self.timing.total_wall_time_ms = wall_time_ms;

        if wall_time_ms > 0.0 {
            let seconds = wall_time_ms / 1000.0;
            self.timing.sim_time_per_second = self.kernel.final_time / seconds;
            self.timing.steps_per_second = self.kernel.steps_executed as f64 / seconds;
        }
    }

    /// Exports statistics to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports statistics to JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports kernel counters to CSV.
    pub fn to_csv(&self) -> String {
        let k = &self.kernel;
        let mut csv = String::new();

        csv.push_str("metric,value\n");
        csv.push_str(&format!("final_time,{}\n", k.final_time));
        csv.push_str(&format!("steps_executed,{}\n", k.steps_executed));
        csv.push_str(&format!("instants,{}\n", k.instants));
        csv.push_str(&format!("longest_cascade,{}\n", k.longest_cascade));
        csv.push_str(&format!("internal_transitions,{}\n", k.internal_transitions));
        csv.push_str(&format!("external_transitions,{}\n", k.external_transitions));
        csv.push_str(&format!("confluent_transitions,{}\n", k.confluent_transitions));
        csv.push_str(&format!("messages_emitted,{}\n", k.messages_emitted));
        csv.push_str(&format!("messages_delivered,{}\n", k.messages_delivered));
        csv.push_str(&format!("messages_unrouted,{}\n", k.messages_unrouted));
        csv.push_str(&format!("external_inputs,{}\n", k.external_inputs));
        csv.push_str(&format!("boundary_outputs,{}\n", k.boundary_outputs));
        csv.push_str(&format!("wall_time_ms,{:.2}\n", self.timing.total_wall_time_ms));

        csv
    }

    /// Exports kernel counters to CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Exports per-model counters to CSV.
    pub fn models_to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("model_id,model,kind,internal,external,confluent,emitted,received\n");

        let mut rows: Vec<_> = self.models.iter().collect();
        rows.sort_by_key(|(_, m)| m.id);
        for (path, m) in rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                m.id,
                path,
                m.kind,
                m.internal_transitions,
                m.external_transitions,
                m.confluent_transitions,
                m.messages_emitted,
                m.messages_received,
            ));
        }

        csv
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        let k = &self.kernel;

        writeln!(w, "=== Simulation Statistics ===")?;
        writeln!(w)?;

        if !self.metadata.name.is_empty() {
            writeln!(w, "Name: {}", self.metadata.name)?;
        }
        if let Some(ref config) = self.metadata.config_file {
            writeln!(w, "Config: {}", config)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Kernel ---")?;
        writeln!(w, "Final simulation time: {}", k.final_time)?;
        writeln!(w, "Steps executed: {} over {} instants", k.steps_executed, k.instants)?;
        writeln!(w, "Longest cascade: {}", k.longest_cascade)?;
        writeln!(
            w,
            "Transitions: {} internal, {} external, {} confluent",
            k.internal_transitions, k.external_transitions, k.confluent_transitions
        )?;
        writeln!(w, "Messages emitted: {}", k.messages_emitted)?;
        writeln!(w, "Messages delivered: {}", k.messages_delivered)?;
        writeln!(w, "Messages unrouted: {}", k.messages_unrouted)?;
        writeln!(w, "External inputs: {}", k.external_inputs)?;
        writeln!(w, "Boundary outputs: {}", k.boundary_outputs)?;
        writeln!(w)?;

        if self.timing.total_wall_time_ms > 0.0 {
            writeln!(w, "--- Timing ---")?;
            writeln!(w, "Wall time: {:.2} ms", self.timing.total_wall_time_ms)?;
            writeln!(w, "Sim time/sec: {:.2}", self.timing.sim_time_per_second)?;
            writeln!(w, "Steps/sec: {:.2}", self.timing.steps_per_second)?;
            writeln!(w)?;
        }

        writeln!(w, "--- Models ---")?;
        for (path, m) in &self.models {
            writeln!(
                w,
                "{} ({}): {} transitions, {} out, {} in",
                path,
                m.kind,
                m.transitions(),
                m.messages_emitted,
                m.messages_received
            )?;
        }

        Ok(())
    }

    /// Returns a summary string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// A simple timer for measuring wall-clock time.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Returns current timestamp as string.
fn unix_now() -> String {
    let now = std::time::SystemTime::now();
    let duration = now.duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    format!("{}s", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_creation() {
        let stats = SimulationStats::new().with_name("Airport");

        assert_eq!(stats.metadata.name, "Airport");
        assert_eq!(stats.metadata.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_record_transition() {
        let mut stats = SimulationStats::new();
        stats.models.insert("Airport.Runway".to_string(), ModelStats::new(3, "Runway"));

        stats.record_transition("Airport.Runway", Transition::External);
        stats.record_transition("Airport.Runway", Transition::Internal);
        stats.record_transition("Airport.ControlTower", Transition::Confluent);

        assert_eq!(stats.transitions(), 3);
        assert_eq!(stats.models["Airport.Runway"].transitions(), 2);
        assert_eq!(stats.models["Airport.Runway"].kind, "Runway");
        assert_eq!(stats.models["Airport.ControlTower"].confluent_transitions, 1);
    }

    #[test]
    fn test_stats_json_export() {
        let mut stats = SimulationStats::new();
        stats.kernel.final_time = 150.0;
        stats.kernel.steps_executed = 17;

        let json = stats.to_json().unwrap();
        assert!(json.contains("150"));
        assert!(json.contains("\"steps_executed\": 17"));
    }

    #[test]
    fn test_stats_csv_export() {
        let mut stats = SimulationStats::new();
        stats.kernel.final_time = 150.0;
        stats.kernel.boundary_outputs = 1;

        let csv = stats.to_csv();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("final_time,150"));
        assert!(csv.contains("boundary_outputs,1"));
    }

    #[test]
    fn test_models_csv_sorted_by_id() {
        let mut stats = SimulationStats::new();
        stats.models.insert("Airport.Runway".to_string(), ModelStats::new(3, "Runway"));
        stats.models.insert("Airport.ControlTower".to_string(), ModelStats::new(0, "ControlTower"));

        let csv = stats.models_to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert!(lines[1].starts_with("0,Airport.ControlTower,ControlTower"));
        assert!(lines[2].starts_with("3,Airport.Runway,Runway"));
    }

    #[test]
    fn test_compute_timing() {
        let mut stats = SimulationStats::new();
        stats.kernel.final_time = 36000.0;
        stats.kernel.steps_executed = 500;
        stats.compute_timing(500.0);

        assert_eq!(stats.timing.sim_time_per_second, 72000.0);
        assert_eq!(stats.timing.steps_per_second, 1000.0);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5.0);
    }

    #[test]
    fn test_summary_output() {
        let mut stats = SimulationStats::new().with_name("Summary Test");
        stats.kernel.final_time = 150.0;
        stats.models.insert("Airport.Runway".to_string(), ModelStats::new(3, "Runway"));

        let summary = stats.summary();
        assert!(summary.contains("Summary Test"));
        assert!(summary.contains("Final simulation time: 150"));
        assert!(summary.contains("Airport.Runway (Runway)"));
    }
}
