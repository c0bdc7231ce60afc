//! Open/closed state and wait-time bucketing, pure policy over
//! `(is_open, wait_minutes)`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Display bucket for a ride's current state. The serialized form doubles
/// as the renderer's CSS-class slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum WaitBucket {
    Closed,
    Unknown,
    WalkOn,
    Short,
    Medium,
    Long,
    VeryLong,
}

impl WaitBucket {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Unknown => "unknown",
            Self::WalkOn => "walk-on",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::VeryLong => "very-long",
        }
    }
}

/// Bucket plus the human-readable label the renderer shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WaitStatus {
    pub bucket: WaitBucket,
    pub label: String,
}

/// Bucket boundaries in minutes, inclusive on the lower bucket
/// (a 20-minute wait is still `short`). Policy constants, configurable so
/// boundaries can be asserted exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WaitThresholds {
    pub short_max: u32,
    pub medium_max: u32,
    pub long_max: u32,
}

impl Default for WaitThresholds {
    fn default() -> Self {
        Self {
            short_max: 20,
            medium_max: 45,
            long_max: 75,
        }
    }
}

impl WaitThresholds {
    /// Boundaries must be strictly ascending to classify exhaustively.
    pub fn validate(&self) -> Result<(), String> {
        if self.short_max < self.medium_max && self.medium_max < self.long_max {
            Ok(())
        } else {
            Err(format!(
                "wait thresholds must be strictly ascending (got {}/{}/{})",
                self.short_max, self.medium_max, self.long_max
            ))
        }
    }
}

/// Classify a ride's state. Checked in order: closed, unknown wait,
/// walk-on, then the timed buckets.
pub fn resolve(is_open: bool, wait_minutes: Option<u32>, thresholds: &WaitThresholds) -> WaitStatus {
    if !is_open {
        return WaitStatus {
            bucket: WaitBucket::Closed,
            label: "Closed".to_string(),
        };
    }
    let Some(minutes) = wait_minutes else {
        return WaitStatus {
            bucket: WaitBucket::Unknown,
            label: "N/A".to_string(),
        };
    };
    if minutes == 0 {
        return WaitStatus {
            bucket: WaitBucket::WalkOn,
            label: "Walk On".to_string(),
        };
    }
    let bucket = if minutes <= thresholds.short_max {
        WaitBucket::Short
    } else if minutes <= thresholds.medium_max {
        WaitBucket::Medium
    } else if minutes <= thresholds.long_max {
        WaitBucket::Long
    } else {
        WaitBucket::VeryLong
    };
    WaitStatus {
        bucket,
        label: format!("{minutes} min"),
    }
}
