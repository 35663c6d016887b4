// Property-based tests for the airport
//
// Invariants over random arrival patterns:
// 1. Every arriving plane departs exactly once (conservation)
// 2. The runway never holds two planes at once (mutual exclusion)
// 3. Each plane lands before it takes off
//
// Each pattern runs under both confluent policies.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use tarmac::airport::{airport_top, path, AirportParams, CONTROL_TOWER, IN_LANDING, RUNWAY};
use tarmac::models::{control_tower, runway};
use tarmac::{ConfluentPolicy, Message, PlaneId, RecordingSink, RunOutcome, Simulation, SimTime};

const RUNWAY_TIME: SimTime = 60.0;

/// Arrival gaps and plane IDs. Gaps of zero give simultaneous arrivals.
fn arrivals_strategy() -> impl Strategy<Value = Vec<(SimTime, PlaneId)>> {
    prop::collection::btree_set(-50i64..1200, 1..12)
        .prop_flat_map(|ids| {
            let n = ids.len();
            (
                Just(ids.into_iter().collect::<Vec<_>>()).prop_shuffle(),
                prop::collection::vec(0u32..200, n),
            )
        })
        .prop_map(|(ids, gaps)| {
            let mut time = 0.0;
            ids.into_iter()
                .zip(gaps)
                .map(|(id, gap)| {
                    time += gap as SimTime;
                    (time, id)
                })
                .collect()
        })
}

const POLICIES: [ConfluentPolicy; 2] = [
    ConfluentPolicy::InternalFirst,
    ConfluentPolicy::ExternalFirst,
];

/// Far beyond the last departure of any generated pattern.
const HORIZON: SimTime = 100_000.0;

fn simulate(arrivals: &[(SimTime, PlaneId)], policy: ConfluentPolicy) -> (Simulation, RecordingSink) {
    let top = airport_top(&AirportParams::default()).unwrap();
    let trace = RecordingSink::new();
    let mut sim = Simulation::new(top)
        .with_policy(policy)
        .with_sink(trace.clone());
    for &(time, id) in arrivals {
        sim.inject(time, IN_LANDING, Message::Plane(id)).unwrap();
    }
    assert_eq!(sim.run_until(HORIZON).unwrap(), RunOutcome::Exhausted, "policy {policy}");
    (sim, trace)
}

fn parse(entries: Vec<(SimTime, String)>) -> Vec<(SimTime, PlaneId)> {
    entries
        .into_iter()
        .map(|(t, payload)| (t, payload.parse().unwrap()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_plane_departs_once(arrivals in arrivals_strategy()) {
        let mut arrived: Vec<PlaneId> = arrivals.iter().map(|&(_, id)| id).collect();
        arrived.sort_unstable();

        for policy in POLICIES {
            let (sim, _) = simulate(&arrivals, policy);
            let mut departed: Vec<PlaneId> = sim
                .outputs()
                .iter()
                .filter_map(|e| e.message.plane())
                .collect();
            departed.sort_unstable();

            prop_assert_eq!(&departed, &arrived, "policy {}", policy);
        }
    }

    #[test]
    fn prop_runway_is_exclusive(arrivals in arrivals_strategy()) {
        let tower = path(&[CONTROL_TOWER]);
        let runway_path = path(&[RUNWAY]);

        for policy in POLICIES {
            let (_, trace) = simulate(&arrivals, policy);

            let mut grants = parse(trace.messages(&tower, control_tower::LAND));
            grants.extend(parse(trace.messages(&tower, control_tower::TAKEOFF)));
            grants.sort_by(|a, b| a.0.total_cmp(&b.0));

            for pair in grants.windows(2) {
                prop_assert!(
                    pair[1].0 - pair[0].0 >= RUNWAY_TIME,
                    "policy {}: grants at {} and {} overlap", policy, pair[0].0, pair[1].0
                );
            }

            // No command was refused: every grant leaves the runway.
            let exits = trace.messages(&runway_path, runway::LANDING_EXIT).len()
                + trace.messages(&runway_path, runway::TAKEOFF_EXIT).len();
            prop_assert_eq!(exits, grants.len(), "policy {}", policy);
            prop_assert_eq!(grants.len(), 2 * arrivals.len(), "policy {}", policy);
        }
    }

    #[test]
    fn prop_landing_precedes_takeoff(arrivals in arrivals_strategy()) {
        let tower = path(&[CONTROL_TOWER]);

        for policy in POLICIES {
            let (_, trace) = simulate(&arrivals, policy);

            let landed: BTreeMap<PlaneId, SimTime> = parse(trace.messages(&tower, control_tower::LAND))
                .into_iter()
                .map(|(t, id)| (id, t))
                .collect();

            for (t, id) in parse(trace.messages(&tower, control_tower::TAKEOFF)) {
                let landing = landed.get(&id).copied();
                prop_assert!(landing.is_some(), "policy {}: plane {} took off without landing", policy, id);
                prop_assert!(t >= landing.unwrap_or(t) + RUNWAY_TIME);
            }
        }
    }

    #[test]
    fn prop_policies_give_same_departures(arrivals in arrivals_strategy()) {
        let (internal, _) = simulate(&arrivals, ConfluentPolicy::InternalFirst);
        let (external, _) = simulate(&arrivals, ConfluentPolicy::ExternalFirst);

        prop_assert_eq!(internal.outputs(), external.outputs());
    }
}
