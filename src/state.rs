//! Shared application state and the snapshot type pushed to the renderer.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use ts_rs::TS;

use crate::model::ride::Area;
use crate::refresh::RefreshSession;
use crate::settings::Settings;

/// Lifecycle phase of the current display, as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Failed,
}

/// Process-wide shared state. Locks are short-lived: take one, read or
/// mutate, release. Never hold a lock across an await.
pub struct AppState {
    session: Mutex<RefreshSession>,
    settings: Mutex<Settings>,
    pub app_config_dir: PathBuf,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(settings: Settings, app_config_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(RefreshSession::new(settings.default_park_id)),
            settings: Mutex::new(settings),
            app_config_dir,
            client: reqwest::Client::new(),
        })
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&RefreshSession) -> R) -> R {
        f(&self.session.lock())
    }

    pub fn with_session_mut<R>(&self, f: impl FnOnce(&mut RefreshSession) -> R) -> R {
        f(&mut self.session.lock())
    }

    pub fn with_settings<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        f(&self.settings.lock())
    }

    pub fn with_settings_mut<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        f(&mut self.settings.lock())
    }
}

/// Everything the renderer needs to draw one frame of the wait-time
/// board. Emitted after every state transition.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct DisplaySnapshot {
    pub park_id: u32,
    pub phase: Phase,
    pub areas: Vec<Area>,
    /// Fetch succeeded but the park reported zero rides.
    pub no_data: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub error_detail: Option<String>,
}

impl DisplaySnapshot {
    pub fn from_session(session: &RefreshSession) -> Self {
        Self {
            park_id: session.park_id,
            phase: session.phase,
            areas: session.areas.clone(),
            no_data: session.is_empty_data(),
            last_success: session.last_success,
            error_detail: session.error_detail.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::refresh::{reduce, RefreshEvent};

    #[test]
    fn snapshot_reflects_session() {
        let state = AppState::new(Settings::default(), PathBuf::from("/tmp"));
        state.with_session_mut(|s| {
            reduce(s, RefreshEvent::Startup);
        });
        let snapshot = state.with_session(DisplaySnapshot::from_session);
        assert_eq!(snapshot.park_id, 334);
        assert_eq!(snapshot.phase, Phase::Loading);
        assert!(!snapshot.no_data);
    }

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Loading).unwrap(), r#""loading""#);
        assert_eq!(serde_json::to_string(&Phase::Failed).unwrap(), r#""failed""#);
    }
}
