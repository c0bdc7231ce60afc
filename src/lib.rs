//! Park Pulse core — normalizes heterogeneous theme-park queue-time feeds
//! into one canonical, orderable model and drives the refresh lifecycle.
//!
//! The crate deliberately contains no rendering: a renderer (webview,
//! terminal, anything) consumes [`state::DisplaySnapshot`] values and owns
//! all presentation concerns. Types crossing that boundary are exported to
//! TypeScript via ts-rs.

pub mod error;
pub mod fetch;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod refresh;
pub mod settings;
pub mod state;
