//! Top-level error type for operations exposed to the CLI and renderer.

use std::fmt;

use serde::Serialize;
use ts_rs::TS;

use crate::fetch::FetchError;
use crate::settings::SettingsError;

#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum AppError {
    UnknownPark { id: u32 },
    Fetch { message: String },
    Settings { message: String },
    Io { message: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::UnknownPark { id } => write!(f, "Unknown park id: {id}"),
            AppError::Fetch { message } => write!(f, "{message}"),
            AppError::Settings { message } => write!(f, "Settings error: {message}"),
            AppError::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Fetch {
            message: e.to_string(),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        AppError::Settings {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_code_and_detail() {
        let json = serde_json::to_value(AppError::UnknownPark { id: 9 }).unwrap();
        assert_eq!(json["code"], "UnknownPark");
        assert_eq!(json["detail"]["id"], 9);
    }

    #[test]
    fn fetch_errors_keep_their_user_facing_message() {
        let err: AppError = FetchError::Http { status: 503, message: None }.into();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn io_variant_displays_its_message() {
        let err = AppError::Io { message: "channel closed".to_string() };
        assert_eq!(err.to_string(), "I/O error: channel closed");
    }
}
