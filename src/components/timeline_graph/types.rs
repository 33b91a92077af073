//! Data structures shared by the layout engine and the timeline input.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D coordinate in graph (world) space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Width/height of a node or a viewport, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// True when either side is zero, negative or not a number.
	pub fn is_degenerate(&self) -> bool {
		!(self.width > 0.0 && self.height > 0.0)
	}
}

/// Node-id to position mapping. Insertion order is irrelevant.
pub type PositionMap = HashMap<String, Point>;

/// A node on one screen of the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<T> {
	/// Unique within one [`GraphModel`](super::graph::GraphModel).
	pub id: String,
	pub position: Point,
	pub size: Size,
	pub draggable: bool,
	pub is_current: bool,
	pub payload: T,
}

/// A directed edge between two nodes of the same graph snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge<U> {
	pub id: String,
	pub source_id: String,
	pub target_id: String,
	pub payload: U,
}

/// Pan and zoom transform applied to the whole screen.
///
/// Screen coordinates are `world * zoom + pan`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	#[serde(rename = "x")]
	pub pan_x: f64,
	#[serde(rename = "y")]
	pub pan_y: f64,
	pub zoom: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			pan_x: 0.0,
			pan_y: 0.0,
			zoom: 1.0,
		}
	}
}

impl Viewport {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.pan_x) / self.zoom, (sy - self.pan_y) / self.zoom)
	}
}

/// Axis-aligned box over a node set, including the node footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl BoundingBox {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn center(&self) -> Point {
		Point::new(
			(self.min_x + self.max_x) / 2.0,
			(self.min_y + self.max_y) / 2.0,
		)
	}
}

/// Scopes persisted positions and remote overrides to one logical graph.
///
/// The milestone screen uses the single global scope; each segment is scoped
/// by its year range so pages of different segments never share state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphInstanceKey {
	Global,
	Range { from_year: i32, to_year: i32 },
}

impl GraphInstanceKey {
	pub fn for_segment(segment: &Segment) -> Self {
		Self::Range {
			from_year: segment.from_year,
			to_year: segment.to_year,
		}
	}

	/// Persistence key: the prefix itself for the global scope,
	/// `"<prefix>-<from>-<to>"` for a range.
	pub fn storage_key(&self, prefix: &str) -> String {
		match self {
			Self::Global => prefix.to_string(),
			Self::Range { from_year, to_year } => format!("{prefix}-{from_year}-{to_year}"),
		}
	}

	/// Remote document path: `global_path` for the global scope,
	/// `"<range_base>-<from>-<to>.json"` for a range.
	pub fn remote_path(&self, global_path: &str, range_base: &str) -> String {
		match self {
			Self::Global => global_path.to_string(),
			Self::Range { from_year, to_year } => {
				format!("{range_base}-{from_year}-{to_year}.json")
			}
		}
	}
}

impl fmt::Display for GraphInstanceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Global => f.write_str("global"),
			Self::Range { from_year, to_year } => write!(f, "{from_year}-{to_year}"),
		}
	}
}

/// A milestone on the top-level timeline.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Milestone {
	pub id: String,
	pub year: i32,
	#[serde(default)]
	pub label: String,
	/// Credential opened when the milestone is clicked.
	#[serde(default, rename = "credentialId")]
	pub credential_id: Option<String>,
}

/// A dated credential shown inside a segment.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Credential {
	pub id: String,
	#[serde(default, rename = "numericId")]
	pub numeric_id: i64,
	#[serde(default)]
	pub title: String,
	pub year: i32,
	#[serde(default)]
	pub date: Option<String>,
	#[serde(default)]
	pub institution: String,
}

/// Credentials between two consecutive milestones.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
	pub from_year: i32,
	pub to_year: i32,
	pub credential_ids: Vec<String>,
}

/// Complete timeline input: milestones and credentials.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TimelineData {
	#[serde(default)]
	pub milestones: Vec<Milestone>,
	#[serde(default)]
	pub credentials: Vec<Credential>,
}

/// Visual variant of the node decoration; selects the node size hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
	#[default]
	Plain,
	/// Nodes carry extra imagery above or below the circle.
	Decorated,
}
