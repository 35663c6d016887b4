//! Atomic models of the airport.
//!
//! # Available Models
//!
//! ## Runway access
//! - [`Queue`] - FIFO of plane requests gated by the tower's stop/done signals
//! - [`ControlTower`] - Admits one plane at a time, landings first
//! - [`Runway`] - Exclusive resource held for a fixed time per operation
//!
//! ## Hangar
//! - [`Selector`] - Routes planes to a storage bay by ID range
//! - [`StorageBay`] - Zero-latency pass-through lane
//! - [`Merger`] - Four-way fan-in with port-order tie-break
//!
//! Each module exports its port names as constants (e.g. [`queue::STOP`]).

mod drain;

pub mod control_tower;
pub mod merger;
pub mod queue;
pub mod runway;
pub mod selector;
pub mod storage_bay;

pub use control_tower::{ControlTower, Operation, TowerPhase};
pub use merger::Merger;
pub use queue::{Queue, QueuePhase};
pub use runway::{Runway, RunwayPhase};
pub use selector::{Bay, BayLimits, Selector, SelectorPhase};
pub use storage_bay::StorageBay;
