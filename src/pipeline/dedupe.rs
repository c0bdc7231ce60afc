//! Collapses duplicate ride records. Upstream feeds sometimes list the
//! same physical ride both under a land and in the root `rides` array.

use indexmap::IndexMap;

use crate::model::ride::Ride;

/// Keep the first record seen for each id, preserving input order. The
/// normalizer emits lands-sourced rides before root-array rides, so lands
/// take precedence. Synthesized ids are unique by construction and never
/// collapse with one another.
pub fn dedupe(rides: Vec<Ride>) -> Vec<Ride> {
    let mut seen: IndexMap<String, Ride> = IndexMap::with_capacity(rides.len());
    for ride in rides {
        seen.entry(ride.id.clone()).or_insert(ride);
    }
    seen.into_values().collect()
}
