//! Airport walkthrough example.
//!
//! A handful of planes arrive at the default airport, two of them at the same
//! instant. Each one lands, taxis to the storage bay picked by its ID, parks
//! and takes off again. The example prints every tower clearance followed by
//! the departures seen on the airport's output port.

use tarmac::airport::{airport_top, path, AirportParams, CONTROL_TOWER, IN_LANDING};
use tarmac::models::control_tower;
use tarmac::{Message, PlaneId, RecordingSink, Simulation, SimTime};

const ARRIVALS: [(SimTime, PlaneId); 4] = [(0.0, 120), (0.0, 480), (45.0, 900), (400.0, 1500)];
const SIM_TIME: SimTime = 2_000.0;

// -----------------------------------------------------------------------------
// Scenario
// -----------------------------------------------------------------------------

fn build() -> Result<(Simulation, RecordingSink), Box<dyn std::error::Error>> {
    let top = airport_top(&AirportParams::default())?;
    let trace = RecordingSink::new();
    let mut sim = Simulation::new(top).with_sink(trace.clone());
    for (time, id) in ARRIVALS {
        sim.inject(time, IN_LANDING, Message::Plane(id))?;
    }
    Ok((sim, trace))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("==== Airport example ====");
    println!("{} planes arrive; each lands, parks and takes off.\n", ARRIVALS.len());

    let (mut sim, trace) = build()?;
    let outcome = sim.run_until(SIM_TIME)?;

    let tower = path(&[CONTROL_TOWER]);
    for (time, id) in trace.messages(&tower, control_tower::LAND) {
        println!("[{time:>6}] tower clears plane {id} to land");
    }
    for (time, id) in trace.messages(&tower, control_tower::TAKEOFF) {
        println!("[{time:>6}] tower clears plane {id} for takeoff");
    }

    println!("\nDepartures:");
    for event in sim.outputs() {
        println!("[{:>6}] {} {}", event.time, event.port, event.message);
    }

    println!("\nRun ended ({outcome:?}) at time {}", sim.clock());
    print!("{}", sim.stats().summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac::RunOutcome;

    #[test]
    fn every_arrival_departs() {
        let (mut sim, _) = build().unwrap();
        assert_eq!(sim.run_until(SIM_TIME).unwrap(), RunOutcome::Exhausted);
        assert_eq!(sim.outputs().len(), ARRIVALS.len());
    }
}
