//! Authoritative node and edge sets for one screen.
//!
//! Node positions are the top-left corner of the node's footprint, matching
//! the bounding-box convention of the fitter. The model does no validation
//! beyond id lookup: operations on unknown ids are ignored, since they only
//! affect cosmetic state.

use std::collections::HashSet;

use log::warn;

use super::types::{Edge, Node, Point, PositionMap};

#[derive(Clone, Debug)]
pub struct GraphModel<T, U> {
	nodes: Vec<Node<T>>,
	edges: Vec<Edge<U>>,
}

impl<T, U> Default for GraphModel<T, U> {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
		}
	}
}

impl<T, U> GraphModel<T, U> {
	pub fn new(nodes: Vec<Node<T>>, edges: Vec<Edge<U>>) -> Self {
		let mut model = Self::default();
		model.initialize(nodes, edges);
		model
	}

	/// Replace the whole node and edge set.
	///
	/// Edges must only reference nodes of the same set; builders guarantee it,
	/// so a dangling edge is a bug (asserted in debug builds, dropped otherwise).
	pub fn initialize(&mut self, nodes: Vec<Node<T>>, mut edges: Vec<Edge<U>>) {
		let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		let before = edges.len();
		edges.retain(|e| ids.contains(e.source_id.as_str()) && ids.contains(e.target_id.as_str()));
		debug_assert_eq!(before, edges.len(), "edges reference missing nodes");
		if before != edges.len() {
			warn!(
				"timeline-graph: dropped {} dangling edges",
				before - edges.len()
			);
		}
		self.nodes = nodes;
		self.edges = edges;
	}

	pub fn nodes(&self) -> &[Node<T>] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge<U>] {
		&self.edges
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&Node<T>> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn edge(&self, id: &str) -> Option<&Edge<U>> {
		self.edges.iter().find(|e| e.id == id)
	}

	pub fn current(&self) -> Option<&Node<T>> {
		self.nodes.iter().find(|n| n.is_current)
	}

	/// Move one node. Returns false for an unknown id.
	pub fn update_node_position(&mut self, id: &str, position: Point) -> bool {
		match self.nodes.iter_mut().find(|n| n.id == id) {
			Some(node) => {
				node.position = position;
				true
			}
			None => false,
		}
	}

	/// Mark `id` as the only current node. Unknown ids leave the marks as they are.
	pub fn set_current(&mut self, id: &str) {
		if self.node(id).is_none() {
			return;
		}
		for node in &mut self.nodes {
			node.is_current = node.id == id;
		}
	}

	/// Lock (`true`) or unlock every node for dragging.
	pub fn lock_draggable(&mut self, locked: bool) {
		for node in &mut self.nodes {
			node.draggable = !locked;
		}
	}

	pub fn positions(&self) -> PositionMap {
		self.nodes
			.iter()
			.map(|n| (n.id.clone(), n.position))
			.collect()
	}

	/// Overwrite positions of the nodes present in `positions` for which
	/// `accept` holds. Returns how many nodes moved.
	pub fn apply_positions(
		&mut self,
		positions: &PositionMap,
		accept: impl Fn(&str) -> bool,
	) -> usize {
		let mut moved = 0;
		for node in &mut self.nodes {
			let Some(p) = positions.get(&node.id) else {
				continue;
			};
			if accept(&node.id) && node.position != *p {
				node.position = *p;
				moved += 1;
			}
		}
		moved
	}

	/// Rewrite every node position in place.
	pub fn map_positions(&mut self, mut f: impl FnMut(Point) -> Point) {
		for node in &mut self.nodes {
			node.position = f(node.position);
		}
	}

	/// Topmost node whose footprint contains `point` (graph space).
	pub fn node_at(&self, point: Point) -> Option<&Node<T>> {
		self.nodes.iter().rev().find(|n| {
			point.x >= n.position.x
				&& point.x <= n.position.x + n.size.width
				&& point.y >= n.position.y
				&& point.y <= n.position.y + n.size.height
		})
	}

	/// Centre of a node's footprint.
	pub fn anchor(&self, id: &str) -> Option<Point> {
		self.node(id).map(|n| {
			Point::new(
				n.position.x + n.size.width / 2.0,
				n.position.y + n.size.height / 2.0,
			)
		})
	}

	/// Edge whose centre-to-centre segment passes within `tolerance` of `point`.
	pub fn edge_at(&self, point: Point, tolerance: f64) -> Option<&Edge<U>> {
		self.edges.iter().find(|e| {
			let (Some(a), Some(b)) = (self.anchor(&e.source_id), self.anchor(&e.target_id)) else {
				return false;
			};
			distance_to_segment(point, a, b) <= tolerance
		})
	}
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq < f64::EPSILON {
		0.0
	} else {
		(((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.x + t * dx, a.y + t * dy);
	((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
