//! Inbound HTTP collaborator: fetches one park's raw queue-time feed,
//! optionally through a CORS-bypass relay, and resolves the payload shape.
//!
//! Everything that can go wrong collapses into [`FetchError`] — the
//! refresh controller is the only layer that turns one of these into a
//! user-visible failure state.

use std::fmt;

use serde::Serialize;
use ts_rs::TS;

use crate::model::ride::RawPayload;
use crate::settings::Settings;

// ── Error type ──────────────────────────────────────────────────────

/// Payload-level fetch failure. Structured so the renderer can match on
/// the code and show appropriate guidance.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum FetchError {
    /// Network unreachable, relay down, timeout.
    Transport { message: String },
    /// Upstream answered with a non-2xx status. Carries any message the
    /// body embedded.
    Http { status: u16, message: Option<String> },
    /// Body was not JSON, or JSON in none of the known shapes.
    Malformed { message: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport { message } => {
                write!(
                    f,
                    "Unable to load wait times. Please check your internet connection. ({message})"
                )
            }
            FetchError::Http { status: 404, message } => {
                write!(f, "Park data not found (HTTP 404)")?;
                if let Some(msg) = message {
                    write!(f, ": {msg}")?;
                }
                Ok(())
            }
            FetchError::Http { status, message } => {
                write!(f, "Wait time service returned HTTP {status}")?;
                if let Some(msg) = message {
                    write!(f, ": {msg}")?;
                }
                Ok(())
            }
            FetchError::Malformed { message } => {
                write!(f, "Unexpected response from wait time service: {message}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

// ── Fetch ───────────────────────────────────────────────────────────

/// Build the feed URL for a park: relay prefix + API base + park path.
pub fn queue_times_url(settings: &Settings, park_id: u32) -> String {
    format!(
        "{}{}{park_id}/queue_times.json",
        settings.relay_prefix, settings.api_base
    )
}

/// Fetch and shape-resolve one park's feed.
pub async fn fetch_payload(
    client: &reqwest::Client,
    settings: &Settings,
    park_id: u32,
) -> Result<RawPayload, FetchError> {
    let url = queue_times_url(settings, park_id);

    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| FetchError::Transport {
            message: e.to_string(),
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| FetchError::Transport {
        message: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            message: embedded_message(&body),
        });
    }

    parse_payload(&body)
}

/// Parse a response body into a shape-resolved payload.
pub fn parse_payload(body: &str) -> Result<RawPayload, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed {
            message: format!("invalid JSON: {e}"),
        })?;
    RawPayload::from_value(&value).map_err(|e| FetchError::Malformed {
        message: e.to_string(),
    })
}

/// Pull a human-readable message out of an error body: a JSON `error` or
/// `message` field when present, otherwise a short text snippet.
fn embedded_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(serde_json::Value::as_str) {
                let msg = msg.trim();
                if !msg.is_empty() {
                    return Some(msg.to_string());
                }
            }
        }
        return None;
    }
    let snippet: String = body.trim().chars().take(120).collect();
    (!snippet.is_empty()).then_some(snippet)
}
