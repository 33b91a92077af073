//! Error type for the fallible leaves of the layout engine.
//!
//! None of these reach the user: callers log them and fall back to the best
//! available default (empty override map, in-memory state only).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
	#[error("no persistent storage available")]
	StorageUnavailable,

	#[error("failed to write storage key {key}: {reason}")]
	StorageWrite { key: String, reason: String },

	#[error("request to {url} failed: {reason}")]
	Fetch { url: String, reason: String },

	#[error("request to {url} returned status {status}")]
	Status { url: String, status: u16 },

	#[error("malformed position document: {0}")]
	Malformed(#[from] serde_json::Error),

	#[error("position document is not a JSON object")]
	NotAnObject,
}
