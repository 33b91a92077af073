//! Deterministic default positions.
//!
//! Two rule-based strategies, both pure functions of the node index:
//!
//! - [`LinearLayout`]: one left-to-right row (the milestone screen).
//! - [`SnakeLayout`]: `row_len` nodes left-to-right on row 0, the rest
//!   right-to-left on row 1, so the last node of row 0 sits right above the
//!   first node of row 1 and the connecting path never crosses itself.

use serde::Deserialize;

use super::types::Point;

/// Single-row layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinearLayout {
	pub spacing_x: f64,
	pub row_y: f64,
}

impl Default for LinearLayout {
	fn default() -> Self {
		Self {
			spacing_x: 220.0,
			row_y: 120.0,
		}
	}
}

/// Two-row zigzag layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnakeLayout {
	pub spacing_x: f64,
	pub row_y: f64,
	pub row_gap: f64,
	/// Nodes on the first (left-to-right) row.
	pub row_len: usize,
}

impl Default for SnakeLayout {
	fn default() -> Self {
		Self {
			spacing_x: 240.0,
			row_y: 140.0,
			row_gap: 200.0,
			row_len: 4,
		}
	}
}

impl SnakeLayout {
	fn second_row_y(&self) -> f64 {
		self.row_y + self.row_gap
	}

	/// Slot for the "next section" node: one step past the last node of a
	/// page holding `page_len` nodes, continuing in that row's direction.
	pub fn continue_position(&self, page_len: usize) -> Point {
		let last_index = page_len.saturating_sub(1);
		let last = self.position(last_index);
		if last_index < self.row_len.max(1) {
			Point::new(last.x + self.spacing_x, last.y)
		} else {
			Point::new(last.x - self.spacing_x, last.y)
		}
	}

	/// Slot for the "previous section" node: one step before index 0.
	pub fn previous_position(&self) -> Point {
		Point::new(-self.spacing_x, self.row_y)
	}

	fn position(&self, index: usize) -> Point {
		let row_len = self.row_len.max(1);
		if index < row_len {
			return Point::new(index as f64 * self.spacing_x, self.row_y);
		}
		let col = (index - row_len) as f64;
		Point::new(
			(row_len as f64 - 1.0 - col) * self.spacing_x,
			self.second_row_y(),
		)
	}
}

/// Strategy used to generate the default position of node `i`.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutStrategy {
	Linear(LinearLayout),
	Snake(SnakeLayout),
}

impl LayoutStrategy {
	/// Default position of the node at `index`.
	///
	/// Deterministic and side-effect free; indices past `2 * row_len` in the
	/// snake strategy keep extending row 1 leftwards.
	pub fn position_for_index(&self, index: usize) -> Point {
		match self {
			LayoutStrategy::Linear(linear) => {
				Point::new(index as f64 * linear.spacing_x, linear.row_y)
			}
			LayoutStrategy::Snake(snake) => snake.position(index),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_row_is_strictly_increasing_with_constant_y() {
		let strategy = LayoutStrategy::Linear(LinearLayout::default());
		for n in 1..20 {
			let points: Vec<Point> = (0..n).map(|i| strategy.position_for_index(i)).collect();
			assert!(points.windows(2).all(|w| w[1].x > w[0].x));
			assert!(points.iter().all(|p| p.y == 120.0));
		}
	}

	#[test]
	fn snake_rows_run_in_opposite_directions() {
		let snake = SnakeLayout::default();
		let k = snake.row_len;
		let strategy = LayoutStrategy::Snake(snake);
		for n in 1..16 {
			let points: Vec<Point> = (0..n).map(|i| strategy.position_for_index(i)).collect();
			let (row0, row1) = points.split_at(n.min(k));
			assert!(row0.windows(2).all(|w| w[1].x > w[0].x));
			assert!(row0.iter().all(|p| p.y == 140.0));
			assert!(row1.windows(2).all(|w| w[1].x < w[0].x));
			assert!(row1.iter().all(|p| p.y == 340.0));
		}
	}

	#[test]
	fn snake_turns_under_the_last_node_of_row_zero() {
		let strategy = LayoutStrategy::Snake(SnakeLayout::default());
		assert_eq!(strategy.position_for_index(3), Point::new(720.0, 140.0));
		assert_eq!(strategy.position_for_index(4), Point::new(720.0, 340.0));
		assert_eq!(strategy.position_for_index(6), Point::new(240.0, 340.0));
	}

	#[test]
	fn same_index_yields_same_position() {
		let strategy = LayoutStrategy::Snake(SnakeLayout::default());
		assert_eq!(strategy.position_for_index(5), strategy.position_for_index(5));
	}

	#[test]
	fn section_slots_extend_the_path() {
		let snake = SnakeLayout::default();
		assert_eq!(snake.previous_position(), Point::new(-240.0, 140.0));
		// Short page stays on row 0 and continues rightwards.
		assert_eq!(snake.continue_position(3), Point::new(720.0, 140.0));
		// Full page ends on row 1 and continues leftwards.
		assert_eq!(snake.continue_position(7), Point::new(0.0, 340.0));
	}
}
