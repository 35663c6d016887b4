//! Airport composition.
//!
//! ```text
//! AirportTop
//! ├── ControlTower
//! ├── LandingQueue
//! ├── TakeoffQueue
//! ├── Runway
//! └── Hangar
//!     ├── Selector
//!     └── StorageBank
//!         ├── Bay1 .. Bay4
//!         └── Merger
//! ```
//!
//! A plane enters on `in_landing`, queues for the runway, lands, is routed
//! to a storage bay, queues again for takeoff and leaves on `out_takeoff`.

use serde::{Deserialize, Serialize};

use crate::coupled::{ConstructionResult, Coupled};
use crate::model::PortDesc;
use crate::models::selector::{self, Bay, BayLimits};
use crate::models::{
    control_tower, merger, queue, runway, storage_bay, ControlTower, Merger, Queue, Runway,
    Selector, StorageBay,
};
use crate::types::SimTime;

/// Plane arrivals of the whole airport.
pub const IN_LANDING: &str = "in_landing";
/// Departed planes.
pub const OUT_TAKEOFF: &str = "out_takeoff";
/// Hangar input.
pub const HANGAR_IN: &str = "in";
/// Hangar output.
pub const HANGAR_EXIT: &str = "hangar_exit";
/// Storage bank output.
pub const BANK_OUT: &str = "out";

pub const AIRPORT: &str = "Airport";
pub const HANGAR: &str = "Hangar";
pub const STORAGE_BANK: &str = "StorageBank";
pub const CONTROL_TOWER: &str = "ControlTower";
pub const LANDING_QUEUE: &str = "LandingQueue";
pub const TAKEOFF_QUEUE: &str = "TakeoffQueue";
pub const RUNWAY: &str = "Runway";
pub const SELECTOR: &str = "Selector";
pub const MERGER: &str = "Merger";

/// Timing and routing parameters of the airport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirportParams {
    /// Runway hold per landing or takeoff
    pub runway_time: SimTime,
    /// Selector latency per plane
    pub routing_time: SimTime,
    /// Upper ID limit of each storage bay
    pub bay_limits: BayLimits,
}

impl Default for AirportParams {
    fn default() -> Self {
        Self {
            runway_time: runway::DEFAULT_OPERATION_TIME,
            routing_time: selector::DEFAULT_ROUTING_TIME,
            bay_limits: BayLimits::default(),
        }
    }
}

/// Component name of a storage bay inside the bank.
pub fn bay_name(bay: Bay) -> String {
    bay.to_string()
}

/// Four storage bays merged into one stream.
///
/// Ports: `in1..in4` (one per bay), `out`.
pub fn storage_bank() -> ConstructionResult<Coupled> {
    let mut bank = Coupled::new(STORAGE_BANK);
    for port in merger::INPUTS {
        bank.add_input(PortDesc::plane(port))?;
    }
    bank.add_output(PortDesc::plane(BANK_OUT))?;

    for bay in Bay::ALL {
        bank.add_atomic(bay_name(bay), StorageBay::new())?;
    }
    bank.add_atomic(MERGER, Merger::new())?;

    for (bay, merger_in) in Bay::ALL.into_iter().zip(merger::INPUTS) {
        let name = bay_name(bay);
        bank.forward_input(merger_in, name.clone(), storage_bay::IN)?;
        bank.connect(name, storage_bay::OUT, MERGER, merger_in)?;
    }
    bank.forward_output(MERGER, merger::OUT, BANK_OUT)?;

    Ok(bank)
}

/// Selector feeding the storage bank.
///
/// Ports: `in`, `hangar_exit`.
pub fn hangar(params: &AirportParams) -> ConstructionResult<Coupled> {
    let mut hangar = Coupled::new(HANGAR);
    hangar.add_input(PortDesc::plane(HANGAR_IN))?;
    hangar.add_output(PortDesc::plane(HANGAR_EXIT))?;

    let selector = Selector::new()
        .with_routing_time(params.routing_time)
        .with_limits(params.bay_limits);
    hangar.add_atomic(SELECTOR, selector)?;
    hangar.add_coupled(storage_bank()?)?;

    hangar.forward_input(HANGAR_IN, SELECTOR, selector::IN)?;
    for (bay, bank_in) in Bay::ALL.into_iter().zip(merger::INPUTS) {
        hangar.connect(SELECTOR, bay.port(), STORAGE_BANK, bank_in)?;
    }
    hangar.forward_output(STORAGE_BANK, BANK_OUT, HANGAR_EXIT)?;

    Ok(hangar)
}

/// The complete airport.
///
/// Ports: `in_landing`, `out_takeoff`.
pub fn airport_top(params: &AirportParams) -> ConstructionResult<Coupled> {
    let mut top = Coupled::new(AIRPORT);
    top.add_input(PortDesc::plane(IN_LANDING))?;
    top.add_output(PortDesc::plane(OUT_TAKEOFF))?;

    top.add_atomic(
        CONTROL_TOWER,
        ControlTower::new().with_runway_time(params.runway_time),
    )?;
    top.add_atomic(LANDING_QUEUE, Queue::new())?;
    top.add_atomic(TAKEOFF_QUEUE, Queue::new())?;
    top.add_atomic(
        RUNWAY,
        Runway::new().with_operation_time(params.runway_time),
    )?;
    top.add_coupled(hangar(params)?)?;

    top.forward_input(IN_LANDING, LANDING_QUEUE, queue::IN)?;

    // Requests
    top.connect(LANDING_QUEUE, queue::OUT, CONTROL_TOWER, control_tower::IN_LANDING)?;
    top.connect(TAKEOFF_QUEUE, queue::OUT, CONTROL_TOWER, control_tower::IN_TAKEOFF)?;

    // Flow control
    top.connect(CONTROL_TOWER, control_tower::STOP_LANDING, LANDING_QUEUE, queue::STOP)?;
    top.connect(CONTROL_TOWER, control_tower::STOP_TAKEOFF, TAKEOFF_QUEUE, queue::STOP)?;
    top.connect(CONTROL_TOWER, control_tower::DONE_LANDING, LANDING_QUEUE, queue::DONE)?;
    top.connect(CONTROL_TOWER, control_tower::DONE_TAKEOFF, TAKEOFF_QUEUE, queue::DONE)?;

    // Runway commands
    top.connect(CONTROL_TOWER, control_tower::LAND, RUNWAY, runway::LAND)?;
    top.connect(CONTROL_TOWER, control_tower::TAKEOFF, RUNWAY, runway::TAKEOFF)?;

    top.connect(RUNWAY, runway::LANDING_EXIT, HANGAR, HANGAR_IN)?;
    top.connect(HANGAR, HANGAR_EXIT, TAKEOFF_QUEUE, queue::IN)?;
    top.forward_output(RUNWAY, runway::TAKEOFF_EXIT, OUT_TAKEOFF)?;

    Ok(top)
}

/// Dotted path of an airport component, e.g. `path(&[HANGAR, SELECTOR])`.
pub fn path(components: &[&str]) -> String {
    std::iter::once(AIRPORT)
        .chain(components.iter().copied())
        .collect::<Vec<_>>()
        .join(".")
}
