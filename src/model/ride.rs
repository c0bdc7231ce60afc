//! Raw upstream feed types and the canonical normalized model.
//!
//! Upstream payloads drift: rides arrive nested under `lands`, in a flat
//! `rides` array, or as a bare array, and individual fields show up with
//! the wrong type from time to time. The raw types here deserialize
//! leniently — a field that is absent or the wrong shape degrades to its
//! neutral value instead of failing the record, and a record that is not
//! even an object is dropped by [`RawPayload::from_value`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

// ── Raw (untrusted) upstream types ──────────────────────────────────

/// One ride record as the upstream feed sends it. Every field is optional
/// and tolerant of type drift; arbitrary extra fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRide {
    /// Upstream id, string or number. Anything else reads as absent.
    #[serde(default, deserialize_with = "de_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub name: Option<String>,
    /// Posted wait in minutes. Floats are rounded, negatives clamp to zero.
    #[serde(default, deserialize_with = "de_wait")]
    pub wait_time: Option<u32>,
    /// True only when the upstream flag is strictly boolean `true`.
    #[serde(default, deserialize_with = "de_strict_true")]
    pub is_open: bool,
    /// Explicit upstream single-rider flag. No name heuristics are applied;
    /// when the feed omits the field the feature is simply absent.
    #[serde(default, deserialize_with = "de_strict_true")]
    pub single_rider: bool,
    #[serde(default, deserialize_with = "de_when")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_text")]
    pub land: Option<String>,
}

/// A themed land grouping rides, as sent upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLand {
    #[serde(default, deserialize_with = "de_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_rides")]
    pub rides: Vec<RawRide>,
}

/// A shape-resolved upstream payload. `lands` and `rides` may both be
/// populated; the normalizer consumes both (lands first).
#[derive(Debug, Clone, Default)]
pub struct RawPayload {
    pub lands: Vec<RawLand>,
    pub rides: Vec<RawRide>,
}

/// The payload was valid JSON but none of the known shapes: not an array,
/// and an object with neither `lands` nor `rides`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeError;

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload has neither `lands` nor `rides` and is not a ride array")
    }
}

impl std::error::Error for ShapeError {}

impl RawPayload {
    /// Resolve one of the three accepted payload shapes:
    /// `{ lands: [...] }` and/or `{ rides: [...] }`, or a bare ride array.
    /// A bare array maps into `rides` (same tagging rules as root rides).
    pub fn from_value(value: &Value) -> Result<Self, ShapeError> {
        match value {
            Value::Array(items) => Ok(Self {
                lands: Vec::new(),
                rides: collect_rides(items),
            }),
            Value::Object(map) => {
                if !map.contains_key("lands") && !map.contains_key("rides") {
                    return Err(ShapeError);
                }
                let lands = match map.get("lands") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter(|v| v.is_object())
                        .filter_map(|v| serde_json::from_value(v.clone()).ok())
                        .collect(),
                    _ => Vec::new(),
                };
                let rides = match map.get("rides") {
                    Some(Value::Array(items)) => collect_rides(items),
                    _ => Vec::new(),
                };
                Ok(Self { lands, rides })
            }
            _ => Err(ShapeError),
        }
    }
}

/// Keep only array elements that are objects; anything else is noise.
fn collect_rides(items: &[Value]) -> Vec<RawRide> {
    items
        .iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}

// ── Lenient field deserializers ─────────────────────────────────────

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped before cast
fn de_wait<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.round().max(0.0).min(f64::from(u32::MAX)) as u32),
        _ => None,
    }))
}

fn de_strict_true<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

fn de_when<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }))
}

fn de_rides<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawRide>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Array(items) => collect_rides(&items),
        _ => Vec::new(),
    })
}

// ── Normalized model ────────────────────────────────────────────────

/// A normalized ride.
///
/// Invariants, upheld by the normalizer:
/// - `id` is unique within one normalization run. Synthesized ids (used
///   when upstream omits one) are NOT stable across refreshes.
/// - `wait_minutes` is `None` whenever `is_open` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ride {
    pub id: String,
    pub name: String,
    pub wait_minutes: Option<u32>,
    pub is_open: bool,
    pub single_rider: bool,
    /// Source area tag before classification; resolved display name after.
    pub area_name: String,
    /// Resolved by the classifier from the override table; `None` before
    /// classification and for areas without an override.
    pub area_color: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A display group of rides. Present in pipeline output only when it holds
/// at least one ride; rides are sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Area {
    pub name: String,
    pub color: Option<String>,
    pub rides: Vec<Ride>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawPayload {
        RawPayload::from_value(&serde_json::from_str(json).unwrap()).unwrap()
    }

    #[test]
    fn lands_shape() {
        let payload = parse(r#"{"lands":[{"name":"Dark Universe","rides":[{"id":1,"name":"Monsters Unchained","wait_time":30,"is_open":true}]}]}"#);
        assert_eq!(payload.lands.len(), 1);
        assert_eq!(payload.lands[0].name.as_deref(), Some("Dark Universe"));
        assert_eq!(payload.lands[0].rides.len(), 1);
        assert!(payload.rides.is_empty());
    }

    #[test]
    fn rides_shape() {
        let payload = parse(r#"{"rides":[{"id":"a","name":"X","wait_time":5,"is_open":true,"land":"Front Lot"}]}"#);
        assert!(payload.lands.is_empty());
        assert_eq!(payload.rides.len(), 1);
        assert_eq!(payload.rides[0].land.as_deref(), Some("Front Lot"));
    }

    #[test]
    fn bare_array_shape() {
        let payload = parse(r#"[{"id":1,"name":"X","is_open":true}]"#);
        assert!(payload.lands.is_empty());
        assert_eq!(payload.rides.len(), 1);
    }

    #[test]
    fn lands_and_rides_both_consumed() {
        let payload = parse(r#"{"lands":[{"name":"L","rides":[{"id":1,"name":"A"}]}],"rides":[{"id":2,"name":"B"}]}"#);
        assert_eq!(payload.lands.len(), 1);
        assert_eq!(payload.rides.len(), 1);
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let value: Value = serde_json::from_str(r#"{"weather":"sunny"}"#).unwrap();
        assert!(matches!(RawPayload::from_value(&value), Err(ShapeError)));
        assert!(matches!(RawPayload::from_value(&Value::Null), Err(ShapeError)));
        assert!(matches!(RawPayload::from_value(&Value::from(42)), Err(ShapeError)));
    }

    #[test]
    fn empty_keyed_payload_is_valid() {
        let payload = parse(r#"{"rides":[]}"#);
        assert!(payload.lands.is_empty());
        assert!(payload.rides.is_empty());
    }

    #[test]
    fn numeric_id_reads_as_string() {
        let payload = parse(r#"{"rides":[{"id":42,"name":"X"}]}"#);
        assert_eq!(payload.rides[0].id.as_deref(), Some("42"));
    }

    #[test]
    fn wait_time_coercion() {
        let payload = parse(
            r#"{"rides":[
                {"name":"a","wait_time":15.6},
                {"name":"b","wait_time":-5},
                {"name":"c","wait_time":null},
                {"name":"d","wait_time":"20"},
                {"name":"e"}
            ]}"#,
        );
        assert_eq!(payload.rides[0].wait_time, Some(16));
        assert_eq!(payload.rides[1].wait_time, Some(0));
        assert_eq!(payload.rides[2].wait_time, None);
        // wrong type degrades to absent, the record survives
        assert_eq!(payload.rides[3].wait_time, None);
        assert_eq!(payload.rides[4].wait_time, None);
    }

    #[test]
    fn is_open_only_on_strict_true() {
        let payload = parse(
            r#"{"rides":[
                {"name":"a","is_open":true},
                {"name":"b","is_open":false},
                {"name":"c","is_open":"true"},
                {"name":"d","is_open":1},
                {"name":"e"}
            ]}"#,
        );
        let open: Vec<bool> = payload.rides.iter().map(|r| r.is_open).collect();
        assert_eq!(open, vec![true, false, false, false, false]);
    }

    #[test]
    fn single_rider_only_on_strict_true() {
        let payload = parse(
            r#"{"rides":[
                {"name":"a","single_rider":true},
                {"name":"b","single_rider":false},
                {"name":"c","single_rider":"yes"},
                {"name":"d","single_rider":1},
                {"name":"e"}
            ]}"#,
        );
        let single: Vec<bool> = payload.rides.iter().map(|r| r.single_rider).collect();
        assert_eq!(single, vec![true, false, false, false, false]);
    }

    #[test]
    fn last_updated_parses_rfc3339() {
        let payload = parse(
            r#"{"rides":[
                {"name":"a","last_updated":"2025-08-20T14:30:00Z"},
                {"name":"b","last_updated":"yesterday"}
            ]}"#,
        );
        assert!(payload.rides[0].last_updated.is_some());
        assert!(payload.rides[1].last_updated.is_none());
    }

    #[test]
    fn non_object_array_entries_are_dropped() {
        let payload = parse(r#"{"rides":[{"name":"a"},"junk",7,null]}"#);
        assert_eq!(payload.rides.len(), 1);
    }
}
