//! Trace records and sinks.
//!
//! The kernel reports every emitted message and every state change as a
//! [`TraceRecord`]. Sinks decide what to do with them: log them, write them as
//! CSV, or keep them in memory for inspection.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{ModelId, SimTime};

/// One observable fact about a simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Simulation time of the fact
    pub time: SimTime,
    /// Flattened model index
    pub model_id: ModelId,
    /// Dotted model path (e.g. `Airport.Hangar.Selector`)
    pub model_name: String,
    /// Output port for message records, `None` for state records
    pub port_name: Option<String>,
    /// Message value or state rendering
    pub payload: String,
}

impl TraceRecord {
    /// A message emitted on `port`.
    pub fn message(
        time: SimTime,
        model_id: ModelId,
        model_name: impl Into<String>,
        port: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            time,
            model_id,
            model_name: model_name.into(),
            port_name: Some(port.into()),
            payload: payload.into(),
        }
    }

    /// A model state after a transition.
    pub fn state(
        time: SimTime,
        model_id: ModelId,
        model_name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            time,
            model_id,
            model_name: model_name.into(),
            port_name: None,
            payload: payload.into(),
        }
    }

    pub fn is_state(&self) -> bool {
        self.port_name.is_none()
    }
}

/// Receives trace records from a running simulation.
pub trait TraceSink: Send {
    /// Handles one record.
    fn record(&mut self, record: &TraceRecord) -> std::io::Result<()>;

    /// Flushes buffered output, if any.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Emits each record as a `tracing` event at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&mut self, record: &TraceRecord) -> std::io::Result<()> {
        match &record.port_name {
            Some(port) => tracing::debug!(
                target: "tarmac::trace",
                time = record.time,
                model = %record.model_name,
                port = %port,
                value = %record.payload,
                "output"
            ),
            None => tracing::debug!(
                target: "tarmac::trace",
                time = record.time,
                model = %record.model_name,
                state = %record.payload,
                "state"
            ),
        }
        Ok(())
    }
}

/// Writes records as `;`-separated rows.
///
/// Columns: `time;model_id;model_name;port_name;data`. State rows leave
/// `port_name` empty.
pub struct CsvSink<W: Write + Send> {
    writer: W,
    header_written: bool,
}

impl<W: Write + Send> CsvSink<W> {
    pub const HEADER: &'static str = "time;model_id;model_name;port_name;data";

    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl CsvSink<std::io::BufWriter<std::fs::File>> {
    /// Creates a sink writing to a new file.
    pub fn create<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(std::io::BufWriter::new(file)))
    }
}

impl<W: Write + Send> TraceSink for CsvSink<W> {
    fn record(&mut self, record: &TraceRecord) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{}", Self::HEADER)?;
            self.header_written = true;
        }
        writeln!(
            self.writer,
            "{};{};{};{};{}",
            record.time,
            record.model_id,
            record.model_name,
            record.port_name.as_deref().unwrap_or(""),
            record.payload
        )
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps every record in a shared buffer.
///
/// Clones share the same buffer, so a clone can be handed to the simulation
/// while the first handle is kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of all records so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Messages emitted by `model_name` on `port`, as `(time, payload)`.
    pub fn messages(&self, model_name: &str, port: &str) -> Vec<(SimTime, String)> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.model_name == model_name && r.port_name.as_deref() == Some(port))
            .map(|r| (r.time, r.payload.clone()))
            .collect()
    }

    /// State renderings of `model_name`, as `(time, state)`.
    pub fn states(&self, model_name: &str) -> Vec<(SimTime, String)> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.model_name == model_name && r.is_state())
            .map(|r| (r.time, r.payload.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl TraceSink for RecordingSink {
    fn record(&mut self, record: &TraceRecord) -> std::io::Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_sink_rows() {
        let mut sink = CsvSink::new(Vec::new());
        sink.record(&TraceRecord::message(60.0, 3, "Airport.Runway", "landing_exit", "100"))
            .unwrap();
        sink.record(&TraceRecord::state(60.0, 3, "Airport.Runway", "{phase=IDLE}"))
            .unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "time;model_id;model_name;port_name;data");
        assert_eq!(lines[1], "60;3;Airport.Runway;landing_exit;100");
        assert_eq!(lines[2], "60;3;Airport.Runway;;{phase=IDLE}");
    }

    #[test]
    fn test_recording_sink_is_shared() {
        let sink = RecordingSink::new();
        let mut handle = sink.clone();

        handle
            .record(&TraceRecord::message(0.0, 1, "Airport.ControlTower", "land", "5"))
            .unwrap();
        handle
            .record(&TraceRecord::state(0.0, 1, "Airport.ControlTower", "{phase=SIGNAL}"))
            .unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.messages("Airport.ControlTower", "land"),
            vec![(0.0, "5".to_string())]
        );
        assert_eq!(sink.states("Airport.ControlTower").len(), 1);

        sink.clear();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_trace_record_serialization() {
        let record = TraceRecord::state(90.0, 5, "Airport.Hangar.StorageBank.Merger", "{}");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"port_name\":null"));
        let back: TraceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_log_sink_accepts_records() {
        let mut sink = LogSink;
        assert!(sink
            .record(&TraceRecord::state(0.0, 0, "Airport.Runway", "{phase=IDLE}"))
            .is_ok());
    }
}
