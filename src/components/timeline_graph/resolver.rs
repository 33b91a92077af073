//! Merges the three position sources of a graph instance.
//!
//! Per node id, highest precedence first: the user's saved override, the
//! curated remote override, the generated default for the node's index.
//! Saved edits therefore survive updates to the curated layout, while users
//! who never moved anything still get the curated layout over the naive one.

use super::layout::LayoutStrategy;
use super::types::{Point, PositionMap};

/// Which source a resolved position came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionSource {
	UserSaved,
	Remote,
	Generated,
}

/// Resolve a single node, given its generated fallback.
pub fn resolve_one(
	id: &str,
	user_saved: &PositionMap,
	remote: &PositionMap,
	generated: Point,
) -> (Point, PositionSource) {
	if let Some(p) = user_saved.get(id) {
		(*p, PositionSource::UserSaved)
	} else if let Some(p) = remote.get(id) {
		(*p, PositionSource::Remote)
	} else {
		(generated, PositionSource::Generated)
	}
}

/// Resolve every id in `node_ids`; a node's index in the slice feeds the
/// layout strategy.
pub fn resolve<S: AsRef<str>>(
	node_ids: &[S],
	user_saved: &PositionMap,
	remote: &PositionMap,
	strategy: &LayoutStrategy,
) -> PositionMap {
	node_ids
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let id = id.as_ref();
			let generated = strategy.position_for_index(index);
			let (point, _) = resolve_one(id, user_saved, remote, generated);
			(id.to_string(), point)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::timeline_graph::layout::LinearLayout;

	fn map(entries: &[(&str, f64, f64)]) -> PositionMap {
		entries
			.iter()
			.map(|(id, x, y)| (id.to_string(), Point::new(*x, *y)))
			.collect()
	}

	#[test]
	fn user_saved_beats_remote_and_generated() {
		let (p, source) = resolve_one(
			"m3",
			&map(&[("m3", 1.0, 2.0)]),
			&map(&[("m3", 10.0, 20.0)]),
			Point::new(999.0, 999.0),
		);
		assert_eq!(p, Point::new(1.0, 2.0));
		assert_eq!(source, PositionSource::UserSaved);
	}

	#[test]
	fn remote_beats_generated() {
		let (p, source) = resolve_one(
			"m3",
			&PositionMap::new(),
			&map(&[("m3", 10.0, 20.0)]),
			Point::new(999.0, 999.0),
		);
		assert_eq!(p, Point::new(10.0, 20.0));
		assert_eq!(source, PositionSource::Remote);
	}

	#[test]
	fn generated_when_no_override_exists() {
		let (p, source) = resolve_one(
			"m3",
			&map(&[("other", 1.0, 1.0)]),
			&map(&[("other", 2.0, 2.0)]),
			Point::new(999.0, 999.0),
		);
		assert_eq!(p, Point::new(999.0, 999.0));
		assert_eq!(source, PositionSource::Generated);
	}

	#[test]
	fn resolve_uses_slice_index_for_generated_positions() {
		let strategy = LayoutStrategy::Linear(LinearLayout::default());
		let resolved = resolve(
			&["a", "b", "c"],
			&map(&[("a", 5.0, 5.0)]),
			&map(&[("c", 7.0, 7.0)]),
			&strategy,
		);
		assert_eq!(resolved["a"], Point::new(5.0, 5.0));
		assert_eq!(resolved["b"], Point::new(220.0, 120.0));
		assert_eq!(resolved["c"], Point::new(7.0, 7.0));
	}
}
