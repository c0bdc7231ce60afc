//! Groups rides into display areas, applying per-park name/color
//! overrides, and sorts everything into stable display order.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::model::ride::{Area, Ride};
use crate::settings::AreaOverrides;

/// Group rides by their tagged area name. Override lookup is
/// case-insensitive and trim-normalized; two differently-cased upstream
/// names resolving to the same override collapse into one area. Unmatched
/// names pass through verbatim, keeping any color a previous pass already
/// resolved (so re-classifying classified output reproduces itself). Zero
/// rides in yields zero areas out — a no-data condition, not an error.
pub fn classify(rides: Vec<Ride>, overrides: &AreaOverrides) -> Vec<Area> {
    let mut groups: IndexMap<String, Area> = IndexMap::new();

    for mut ride in rides {
        let (display_name, color) = match overrides.get(&ride.area_name) {
            Some(o) => (o.display_name.clone(), o.color.clone()),
            None => (ride.area_name.clone(), ride.area_color.clone()),
        };
        ride.area_name = display_name.clone();
        ride.area_color = color.clone();

        groups
            .entry(display_name.clone())
            .or_insert_with(|| Area {
                name: display_name,
                color,
                rides: Vec::new(),
            })
            .rides
            .push(ride);
    }

    let mut areas: Vec<Area> = groups.into_values().collect();
    for area in &mut areas {
        area.rides.sort_by(|a, b| display_cmp(&a.name, &b.name));
    }
    areas.sort_by(|a, b| display_cmp(&a.name, &b.name));
    areas
}

/// Case-aware name ordering: case-insensitive primary key with the
/// original string as tiebreak, so repeated runs order identically.
pub fn display_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
