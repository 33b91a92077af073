//! Tunable constants for layout, fitting, scheduling and persistence.
//!
//! Every struct implements [`Default`] with the values the timeline ships
//! with, and deserializes with all fields optional so an embedded JSON
//! document only needs to name what it overrides.

use serde::Deserialize;

use super::layout::{LinearLayout, SnakeLayout};
use super::types::{Size, Variant};

/// Node footprint used for bounding boxes, per visual variant.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizeHints {
	pub plain: Size,
	/// Decorated nodes carry imagery above/below the circle, so they are taller.
	pub decorated: Size,
}

impl Default for SizeHints {
	fn default() -> Self {
		Self {
			plain: Size::new(100.0, 100.0),
			decorated: Size::new(120.0, 280.0),
		}
	}
}

impl SizeHints {
	pub fn for_variant(&self, variant: Variant) -> Size {
		match variant {
			Variant::Plain => self.plain,
			Variant::Decorated => self.decorated,
		}
	}
}

/// Viewport fitting parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FitSettings {
	/// Fraction of the viewport the fitted box may occupy (0.85 leaves a 15% margin).
	pub padding: f64,
	/// Zoom pinned by the layout-rescale mode.
	pub rescale_zoom: f64,
	/// Transition length for fits triggered by explicit navigation.
	pub navigation_duration_ms: u32,
	/// Wheel zoom bounds for the viewport-fit mode.
	pub min_zoom: f64,
	pub max_zoom: f64,
}

impl Default for FitSettings {
	fn default() -> Self {
		Self {
			padding: 0.85,
			rescale_zoom: 1.0,
			navigation_duration_ms: 400,
			min_zoom: 0.1,
			max_zoom: 10.0,
		}
	}
}

/// Fit scheduling delays, all in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
	/// Trailing debounce window for coalesced fit requests.
	pub debounce_ms: f64,
	/// Delay before a navigation fit that animates.
	pub navigation_animated_delay_ms: f64,
	/// Delay before a navigation fit that applies instantly.
	pub navigation_instant_delay_ms: f64,
	/// Rendered frames to wait before a retrying fit starts its timers.
	pub retry_frames: u32,
	/// Offsets of the retry attempts, measured from the end of the frame wait.
	pub retry_offsets_ms: Vec<f64>,
	/// Retrying fits stop after this long, whether or not attempts remain.
	pub retry_window_ms: f64,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			debounce_ms: 280.0,
			navigation_animated_delay_ms: 50.0,
			navigation_instant_delay_ms: 100.0,
			retry_frames: 2,
			retry_offsets_ms: vec![50.0, 220.0],
			retry_window_ms: 300.0,
		}
	}
}

/// Persistence key prefixes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
	pub main_positions: String,
	pub segment_positions: String,
	pub main_viewport: String,
}

impl Default for StorageKeys {
	fn default() -> Self {
		Self {
			main_positions: "timeline-main-positions".into(),
			segment_positions: "timeline-segment-positions".into(),
			main_viewport: "timeline-main-viewport".into(),
		}
	}
}

/// Locations of the curated position documents.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RemotePaths {
	pub main: String,
	/// Segment documents live at `"<segment_base>-<from>-<to>.json"`.
	pub segment_base: String,
}

impl Default for RemotePaths {
	fn default() -> Self {
		Self {
			main: "/data/timeline-positions.json".into(),
			segment_base: "/data/segment-positions".into(),
		}
	}
}

/// Complete timeline configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
	pub linear: LinearLayout,
	pub snake: SnakeLayout,
	/// Credentials per segment page.
	pub page_size: usize,
	pub size_hints: SizeHints,
	pub fit: FitSettings,
	pub scheduler: SchedulerConfig,
	pub storage: StorageKeys,
	pub remote: RemotePaths,
}

impl Default for TimelineConfig {
	fn default() -> Self {
		Self {
			linear: LinearLayout::default(),
			snake: SnakeLayout::default(),
			page_size: 7,
			size_hints: SizeHints::default(),
			fit: FitSettings::default(),
			scheduler: SchedulerConfig::default(),
			storage: StorageKeys::default(),
			remote: RemotePaths::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_document_keeps_remaining_defaults() {
		let config: TimelineConfig =
			serde_json::from_str(r#"{ "page_size": 5, "fit": { "padding": 0.9 } }"#).unwrap();
		assert_eq!(config.page_size, 5);
		assert_eq!(config.fit.padding, 0.9);
		assert_eq!(config.fit.navigation_duration_ms, 400);
		assert_eq!(config.scheduler.debounce_ms, 280.0);
		assert_eq!(config.snake, SnakeLayout::default());
	}

	#[test]
	fn size_hint_follows_variant() {
		let hints = SizeHints::default();
		assert_eq!(hints.for_variant(Variant::Plain), Size::new(100.0, 100.0));
		assert_eq!(hints.for_variant(Variant::Decorated), Size::new(120.0, 280.0));
	}
}
