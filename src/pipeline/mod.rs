//! The normalization pipeline: raw payload → normalize → dedupe →
//! classify. Per-record problems are absorbed inside the stages (the
//! offending record is skipped); only payload-level failures surface, and
//! those are raised before this module runs (see [`crate::fetch`]).

pub mod classify;
pub mod dedupe;
pub mod normalize;
pub mod status;

pub use classify::{classify, display_cmp};
pub use dedupe::dedupe;
pub use normalize::{normalize, FALLBACK_AREA};
pub use status::{resolve, WaitBucket, WaitStatus, WaitThresholds};

use crate::model::ride::{Area, RawPayload};
use crate::settings::AreaOverrides;

/// Run the full pipeline over one payload. An empty result is the
/// "no data" condition, distinct from any error.
pub fn run(payload: &RawPayload, overrides: &AreaOverrides) -> Vec<Area> {
    classify(dedupe(normalize(payload)), overrides)
}
