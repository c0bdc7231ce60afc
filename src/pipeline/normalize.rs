//! Converts one shape-resolved upstream payload into a flat list of
//! normalized rides, pre-dedup and pre-grouping.

use crate::model::ride::{RawPayload, RawRide, Ride};

/// Sentinel area for root-array rides that carry no `land` tag.
pub const FALLBACK_AREA: &str = "Other Attractions";

/// Flatten a payload into normalized rides. Lands-sourced rides come first
/// (the deduplicator relies on that ordering for lands precedence), then
/// root-array rides. Records without a name are skipped, never fatal.
pub fn normalize(payload: &RawPayload) -> Vec<Ride> {
    let mut ids = IdSynthesizer::default();
    let mut rides = Vec::new();

    for land in &payload.lands {
        let area = land.name.as_deref().unwrap_or(FALLBACK_AREA);
        for raw in &land.rides {
            if let Some(ride) = normalize_record(raw, area, &mut ids) {
                rides.push(ride);
            }
        }
    }

    for raw in &payload.rides {
        let area = raw.land.as_deref().unwrap_or(FALLBACK_AREA);
        if let Some(ride) = normalize_record(raw, area, &mut ids) {
            rides.push(ride);
        }
    }

    rides
}

/// Normalize one record, tagged with its source area. Returns `None` for
/// records with no usable name.
fn normalize_record(raw: &RawRide, area_name: &str, ids: &mut IdSynthesizer) -> Option<Ride> {
    let name = raw.name.clone()?;
    let id = match &raw.id {
        Some(id) => id.clone(),
        None => ids.synthesize(&name),
    };
    // Invariant: a closed ride never carries a wait time.
    let wait_minutes = if raw.is_open { raw.wait_time } else { None };

    Some(Ride {
        id,
        name,
        wait_minutes,
        is_open: raw.is_open,
        single_rider: raw.single_rider,
        area_name: area_name.to_string(),
        area_color: None,
        last_updated: raw.last_updated,
    })
}

// ── Synthesized identifiers ─────────────────────────────────────────

/// Generates ids for records the upstream sends without one. The counter
/// guarantees uniqueness within the run; the random suffix marks the id as
/// synthesized and unstable across refreshes (no cross-refresh identity is
/// promised for id-less rides).
#[derive(Default)]
struct IdSynthesizer {
    next: u32,
}

impl IdSynthesizer {
    fn synthesize(&mut self, name: &str) -> String {
        let ordinal = self.next;
        self.next += 1;
        let suffix: u32 = rand::random();
        format!("{}~{ordinal}~{suffix:08x}", slugify(name))
    }
}

/// Convert a name to a safe id slug.
pub(crate) fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    // Collapse multiple dashes
    let mut result = String::new();
    let mut last_dash = false;
    for c in slug.chars() {
        if c == '-' {
            if !last_dash && !result.is_empty() {
                result.push('-');
            }
            last_dash = true;
        } else {
            result.push(c);
            last_dash = false;
        }
    }
    while result.ends_with('-') {
        result.pop();
    }
    if result.is_empty() {
        "ride".to_string()
    } else {
        result
    }
}
