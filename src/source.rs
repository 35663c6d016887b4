//! Event files.
//!
//! An event file lists timed inputs, one per line. Blank lines and lines
//! starting with `#` are ignored. Two layouts exist:
//!
//! - `time value` when every event goes to the same port (airport arrivals);
//! - `time selector value` when a numeric selector picks the port (single
//!   model drivers, e.g. `0` = `in`, `1` = `stop`, `2` = `done` for a queue).
//!
//! Values on plane ports are plane IDs. Values on signal ports are ignored
//! beyond being numeric.
//!
//! ```
//! use tarmac::message::Message;
//! use tarmac::model::PortDesc;
//! use tarmac::source::EventSource;
//!
//! let source = EventSource::single(PortDesc::plane("in_landing"));
//! let events = source.parse_str("# arrivals\n0 100\n15 260\n").unwrap();
//!
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[1].time, 15.0);
//! assert_eq!(events[1].message, Message::Plane(260));
//! ```

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use thiserror::Error;

use crate::message::{ExternalEvent, Message, PortType};
use crate::model::PortDesc;
use crate::types::{is_valid_time, PlaneId, SimTime};

/// Errors raised while reading an event file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Line {line}: unknown port selector {selector}")]
    UnknownSelector { line: usize, selector: i64 },

    #[error("Line {line}: time {time} is earlier than the previous event at {previous}")]
    OutOfOrder {
        line: usize,
        time: SimTime,
        previous: SimTime,
    },
}

/// Result type for event file operations.
pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Clone, Debug)]
enum Layout {
    Single(PortDesc),
    Selected(BTreeMap<i64, PortDesc>),
}

/// Parser for one event file layout.
#[derive(Clone, Debug)]
pub struct EventSource {
    layout: Layout,
}

impl EventSource {
    /// `time value` lines, all delivered on `port`.
    pub fn single(port: PortDesc) -> Self {
        Self {
            layout: Layout::Single(port),
        }
    }

    /// `time selector value` lines, with `selectors` mapping to ports.
    pub fn selected(selectors: impl IntoIterator<Item = (i64, PortDesc)>) -> Self {
        Self {
            layout: Layout::Selected(selectors.into_iter().collect()),
        }
    }

    /// Port reached by `selector`, if any.
    pub fn port(&self, selector: i64) -> Option<&PortDesc> {
        match &self.layout {
            Layout::Single(port) => Some(port),
            Layout::Selected(map) => map.get(&selector),
        }
    }

    /// Reads and parses a file.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> SourceResult<Vec<ExternalEvent>> {
        let file = std::fs::File::open(path)?;
        self.parse_reader(std::io::BufReader::new(file))
    }

    /// Parses an in-memory event list.
    pub fn parse_str(&self, text: &str) -> SourceResult<Vec<ExternalEvent>> {
        self.parse_reader(text.as_bytes())
    }

    /// Parses events from any buffered reader.
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> SourceResult<Vec<ExternalEvent>> {
        let mut events = Vec::new();
        let mut previous: Option<SimTime> = None;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let event = self.parse_line(line_no, text)?;
            if let Some(prev) = previous {
                if event.time < prev {
                    return Err(SourceError::OutOfOrder {
                        line: line_no,
                        time: event.time,
                        previous: prev,
                    });
                }
            }
            previous = Some(event.time);
            events.push(event);
        }

        tracing::debug!(events = events.len(), "Event file parsed");
        Ok(events)
    }

    fn parse_line(&self, line: usize, text: &str) -> SourceResult<ExternalEvent> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let malformed = |reason: String| SourceError::Malformed { line, reason };

        let (time, port, value) = match (&self.layout, fields.as_slice()) {
            (Layout::Single(port), [time, value]) => (*time, port, *value),
            (Layout::Selected(map), [time, selector, value]) => {
                let selector: i64 = selector
                    .parse()
                    .map_err(|_| malformed(format!("invalid port selector `{selector}`")))?;
                let port = map
                    .get(&selector)
                    .ok_or(SourceError::UnknownSelector { line, selector })?;
                (*time, port, *value)
            }
            (Layout::Single(_), _) => {
                return Err(malformed(format!(
                    "expected `time value`, got {} fields",
                    fields.len()
                )))
            }
            (Layout::Selected(_), _) => {
                return Err(malformed(format!(
                    "expected `time port value`, got {} fields",
                    fields.len()
                )))
            }
        };

        let time: SimTime = time
            .parse()
            .map_err(|_| malformed(format!("invalid time `{time}`")))?;
        if !is_valid_time(time) {
            return Err(malformed(format!("time must be finite and non-negative, got {time}")));
        }

        let message = match port.ty {
            PortType::Plane => {
                let id: PlaneId = value
                    .parse()
                    .map_err(|_| malformed(format!("invalid plane ID `{value}`")))?;
                Message::Plane(id)
            }
            PortType::Signal => {
                value
                    .parse::<f64>()
                    .map_err(|_| malformed(format!("invalid signal value `{value}`")))?;
                Message::Signal
            }
        };

        Ok(ExternalEvent::new(time, port.name.clone(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_source() -> EventSource {
        EventSource::selected([
            (0, PortDesc::plane("in")),
            (1, PortDesc::signal("stop")),
            (2, PortDesc::signal("done")),
        ])
    }

    #[test]
    fn test_single_layout() {
        let source = EventSource::single(PortDesc::plane("in_landing"));
        let events = source.parse_str("0 100\n\n  # comment\n10.5 250\n").unwrap();

        assert_eq!(
            events,
            vec![
                ExternalEvent::plane(0.0, "in_landing", 100),
                ExternalEvent::plane(10.5, "in_landing", 250),
            ]
        );
    }

    #[test]
    fn test_selected_layout() {
        let events = queue_source().parse_str("0 0 7\n0 1 1\n60 2 1\n").unwrap();

        assert_eq!(events[0], ExternalEvent::plane(0.0, "in", 7));
        assert_eq!(events[1], ExternalEvent::new(0.0, "stop", Message::Signal));
        assert_eq!(events[2], ExternalEvent::new(60.0, "done", Message::Signal));
    }

    #[test]
    fn test_unknown_selector() {
        let err = queue_source().parse_str("0 0 7\n5 3 1\n").unwrap_err();
        assert!(matches!(err, SourceError::UnknownSelector { line: 2, selector: 3 }));
    }

    #[test]
    fn test_malformed_lines() {
        let single = EventSource::single(PortDesc::plane("in"));
        assert!(matches!(single.parse_str("0 1 2"), Err(SourceError::Malformed { line: 1, .. })));
        assert!(matches!(single.parse_str("abc 1"), Err(SourceError::Malformed { .. })));
        assert!(matches!(single.parse_str("-1 1"), Err(SourceError::Malformed { .. })));
        assert!(matches!(single.parse_str("1 plane"), Err(SourceError::Malformed { .. })));
        assert!(matches!(queue_source().parse_str("0 x 1"), Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_time_must_not_go_backwards() {
        let single = EventSource::single(PortDesc::plane("in"));
        let err = single.parse_str("10 1\n10 2\n5 3\n").unwrap_err();
        match err {
            SourceError::OutOfOrder { line, time, previous } => {
                assert_eq!(line, 3);
                assert_eq!(time, 5.0);
                assert_eq!(previous, 10.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_port_lookup() {
        assert_eq!(queue_source().port(1).map(|p| p.name.as_str()), Some("stop"));
        assert!(queue_source().port(9).is_none());
    }
}
