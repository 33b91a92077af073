//! Fixed-size pages over an ordered id list, with section transition nodes.
//!
//! Page `p` holds `ids[p * page_size .. min((p + 1) * page_size, n)]` laid out
//! with the snake strategy. A "previous section" node precedes the first real
//! node when an earlier page exists; a "next section" node follows the last
//! real node when a later page exists. Page changes move by one step only.

use super::layout::{LayoutStrategy, SnakeLayout};
use super::resolver::resolve_one;
use super::types::{Point, PositionMap};

pub const PREVIOUS_SECTION_ID: &str = "segment-previous-section";
pub const NEXT_SECTION_ID: &str = "segment-continue";

/// Role of a node on a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotKind {
	/// A real item; `index` is its position within the whole list.
	Item { index: usize },
	PreviousSection,
	NextSection,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageSlot {
	pub id: String,
	pub kind: SlotKind,
	pub position: Point,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLink {
	pub id: String,
	pub source_id: String,
	pub target_id: String,
}

/// Node and edge skeleton of one page, positions resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct PageLayout {
	pub slots: Vec<PageSlot>,
	pub links: Vec<PageLink>,
}

impl PageLayout {
	/// Ids of the real items, in path order.
	pub fn item_ids(&self) -> Vec<&str> {
		self.slots
			.iter()
			.filter(|s| matches!(s.kind, SlotKind::Item { .. }))
			.map(|s| s.id.as_str())
			.collect()
	}
}

#[derive(Clone, Debug)]
pub struct PaginationController {
	ids: Vec<String>,
	page_size: usize,
	page: usize,
}

impl PaginationController {
	/// `initial_page` is clamped into range.
	pub fn new(ids: Vec<String>, page_size: usize, initial_page: usize) -> Self {
		let mut controller = Self {
			ids,
			page_size: page_size.max(1),
			page: 0,
		};
		controller.page = initial_page.min(controller.total_pages() - 1);
		controller
	}

	pub fn page(&self) -> usize {
		self.page
	}

	pub fn page_size(&self) -> usize {
		self.page_size
	}

	pub fn total_items(&self) -> usize {
		self.ids.len()
	}

	/// At least one page, even for an empty list.
	pub fn total_pages(&self) -> usize {
		self.ids.len().div_ceil(self.page_size).max(1)
	}

	pub fn has_next(&self) -> bool {
		self.page + 1 < self.total_pages()
	}

	pub fn has_previous(&self) -> bool {
		self.page > 0
	}

	/// Global index of the first item on the current page.
	pub fn page_start(&self) -> usize {
		self.page * self.page_size
	}

	pub fn page_ids(&self) -> &[String] {
		let start = self.page_start().min(self.ids.len());
		let end = (start + self.page_size).min(self.ids.len());
		&self.ids[start..end]
	}

	/// "current/total" label shown on the section nodes.
	pub fn section_fraction(&self) -> String {
		format!("{}/{}", self.page + 1, self.total_pages())
	}

	/// Move to the next page. False at the last page.
	pub fn advance(&mut self) -> bool {
		if !self.has_next() {
			return false;
		}
		self.page += 1;
		true
	}

	/// Move to the previous page. False at the first page.
	pub fn retreat(&mut self) -> bool {
		if !self.has_previous() {
			return false;
		}
		self.page -= 1;
		true
	}

	/// Build the current page. Every position goes through saved > remote >
	/// generated, section nodes included.
	pub fn build_page(
		&self,
		snake: &SnakeLayout,
		user_saved: &PositionMap,
		remote: &PositionMap,
	) -> PageLayout {
		let strategy = LayoutStrategy::Snake(snake.clone());
		let page_ids = self.page_ids();
		let start = self.page_start();
		let mut slots = Vec::with_capacity(page_ids.len() + 2);
		let mut links = Vec::with_capacity(page_ids.len() + 1);

		let (Some(first), Some(last)) = (page_ids.first(), page_ids.last()) else {
			return PageLayout { slots, links };
		};

		if self.has_previous() {
			let (position, _) =
				resolve_one(PREVIOUS_SECTION_ID, user_saved, remote, snake.previous_position());
			slots.push(PageSlot {
				id: PREVIOUS_SECTION_ID.to_string(),
				kind: SlotKind::PreviousSection,
				position,
			});
			links.push(PageLink {
				id: format!("e-previous-{first}"),
				source_id: PREVIOUS_SECTION_ID.to_string(),
				target_id: first.clone(),
			});
		}

		for (i, id) in page_ids.iter().enumerate() {
			let (position, _) =
				resolve_one(id, user_saved, remote, strategy.position_for_index(i));
			slots.push(PageSlot {
				id: id.clone(),
				kind: SlotKind::Item { index: start + i },
				position,
			});
		}
		links.extend(page_ids.windows(2).map(|pair| PageLink {
			id: format!("e-{}-{}", pair[0], pair[1]),
			source_id: pair[0].clone(),
			target_id: pair[1].clone(),
		}));

		if self.has_next() {
			let generated = snake.continue_position(page_ids.len());
			let (position, _) = resolve_one(NEXT_SECTION_ID, user_saved, remote, generated);
			slots.push(PageSlot {
				id: NEXT_SECTION_ID.to_string(),
				kind: SlotKind::NextSection,
				position,
			});
			links.push(PageLink {
				id: format!("e-{last}-continue"),
				source_id: last.clone(),
				target_id: NEXT_SECTION_ID.to_string(),
			});
		}

		PageLayout { slots, links }
	}
}
