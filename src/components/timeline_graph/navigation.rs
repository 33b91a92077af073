//! Sequential traversal over the real nodes of a screen.

/// What a navigation step asks the owner to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavStep {
	/// Highlight the node at this index and refit.
	Moved(usize),
	/// Past the last node of a paginated screen.
	AdvancePage,
	/// Before the first node of a paginated screen.
	RetreatPage,
	/// At a bound of a non-paginated screen, or nothing to navigate.
	Stay,
}

/// Current index in `[0, len)`.
///
/// Paginated screens hand the bounds over to the page controller; other
/// screens clamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationCursor {
	current: usize,
	len: usize,
	paginated: bool,
}

impl NavigationCursor {
	pub fn new(len: usize, paginated: bool) -> Self {
		Self {
			current: 0,
			len,
			paginated,
		}
	}

	pub fn current(&self) -> usize {
		self.current
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Back to index 0 over a new node count.
	pub fn reset(&mut self, len: usize) {
		self.current = 0;
		self.len = len;
	}

	pub fn next(&mut self) -> NavStep {
		if self.current + 1 < self.len {
			self.current += 1;
			NavStep::Moved(self.current)
		} else if self.paginated {
			NavStep::AdvancePage
		} else {
			NavStep::Stay
		}
	}

	pub fn prev(&mut self) -> NavStep {
		if self.current > 0 && self.len > 0 {
			self.current -= 1;
			NavStep::Moved(self.current)
		} else if self.paginated {
			NavStep::RetreatPage
		} else {
			NavStep::Stay
		}
	}

	/// Absolute jump; out-of-range indices are ignored.
	pub fn go_to(&mut self, index: usize) -> NavStep {
		if index < self.len {
			self.current = index;
			NavStep::Moved(index)
		} else {
			NavStep::Stay
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamps_without_pagination() {
		let mut cursor = NavigationCursor::new(3, false);
		assert_eq!(cursor.prev(), NavStep::Stay);
		assert_eq!(cursor.next(), NavStep::Moved(1));
		assert_eq!(cursor.next(), NavStep::Moved(2));
		assert_eq!(cursor.next(), NavStep::Stay);
		assert_eq!(cursor.current(), 2);
	}

	#[test]
	fn delegates_bounds_to_pagination() {
		let mut cursor = NavigationCursor::new(2, true);
		assert_eq!(cursor.prev(), NavStep::RetreatPage);
		assert_eq!(cursor.next(), NavStep::Moved(1));
		assert_eq!(cursor.next(), NavStep::AdvancePage);
		assert_eq!(cursor.current(), 1);
	}

	#[test]
	fn go_to_ignores_out_of_range() {
		let mut cursor = NavigationCursor::new(4, false);
		assert_eq!(cursor.go_to(3), NavStep::Moved(3));
		assert_eq!(cursor.go_to(4), NavStep::Stay);
		assert_eq!(cursor.current(), 3);
		cursor.reset(2);
		assert_eq!(cursor.current(), 0);
		assert_eq!(cursor.len(), 2);
	}
}
