//! Per-context controller for one timeline screen.
//!
//! A [`GraphInstance`] owns everything that belongs to one graph context (the
//! milestone overview, or one segment): the node/edge model, saved and remote
//! positions, the fitter, the fit scheduler, navigation and pagination state,
//! and the viewport. It is created when the context is entered and dropped on
//! teardown, so no timer, flag or in-flight fetch outlives its context.
//!
//! All time-dependent operations take `now_ms`; the owner polls
//! [`GraphInstance::tick`] once per rendered frame.

use std::rc::Rc;

use log::{debug, info};

use super::config::TimelineConfig;
use super::fit::{FitMode, FitOutcome, Transition, ViewportAnimator, ViewportFitter, ViewportSink};
use super::graph::GraphModel;
use super::layout::LayoutStrategy;
use super::navigation::{NavStep, NavigationCursor};
use super::pagination::{NEXT_SECTION_ID, PREVIOUS_SECTION_ID, PaginationController, SlotKind};
use super::remote::{RemotePhase, RemoteSync, RemoteTicket};
use super::resolver::resolve;
use super::scheduler::{FitScheduler, FitTrigger};
use super::segments::{build_segments, circle_label, ordered_credentials};
use super::store::{BrowserStore, KeyValueStore, MemoryStore, PositionStore, StorageArea, ViewportStore};
use super::types::{
	Credential, Edge, GraphInstanceKey, Milestone, Node, Point, PositionMap, Segment, Size,
	TimelineData, Variant, Viewport,
};

/// Pointer travel (screen pixels) below which a press counts as a click.
const CLICK_SLOP: f64 = 4.0;
/// Edge hit tolerance in screen pixels.
const EDGE_HIT_PX: f64 = 6.0;

/// What a node stands for.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
	Milestone(Milestone),
	Credential {
		credential: Credential,
		label: String,
		/// Position in the whole segment, not just the page.
		index: usize,
	},
	PreviousSection {
		fraction: String,
	},
	NextSection {
		fraction: String,
	},
}

impl NodePayload {
	pub fn label(&self) -> String {
		match self {
			NodePayload::Milestone(m) => m.label.clone(),
			NodePayload::Credential { label, .. } => label.clone(),
			NodePayload::PreviousSection { fraction } => format!("Previous section {fraction}"),
			NodePayload::NextSection { fraction } => format!("Next section {fraction}"),
		}
	}

	pub fn is_section(&self) -> bool {
		matches!(
			self,
			NodePayload::PreviousSection { .. } | NodePayload::NextSection { .. }
		)
	}
}

/// What an edge stands for.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgePayload {
	/// Milestone-to-milestone edge leading into a segment.
	Segment(Segment),
	/// Step along a segment page.
	Path,
}

impl EdgePayload {
	pub fn label(&self) -> Option<String> {
		match self {
			EdgePayload::Segment(segment) => {
				let count = segment.credential_ids.len();
				(count > 0).then(|| {
					format!("{count} credential{}", if count == 1 { "" } else { "s" })
				})
			}
			EdgePayload::Path => None,
		}
	}
}

pub type TimelineModel = GraphModel<NodePayload, EdgePayload>;

/// Raised outward; the application decides what a click means.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	NodeClicked {
		id: String,
		payload: NodePayload,
		/// Page of the segment screen the click happened on.
		page: Option<usize>,
	},
	EdgeClicked {
		id: String,
		payload: EdgePayload,
	},
}

/// Storage backends injected into every instance.
#[derive(Clone)]
pub struct Stores {
	/// Durable: manual layouts.
	pub local: Rc<dyn KeyValueStore>,
	/// Per tab session: last viewport.
	pub session: Rc<dyn KeyValueStore>,
}

impl Stores {
	pub fn browser() -> Self {
		Self {
			local: Rc::new(BrowserStore::new(StorageArea::Local)),
			session: Rc::new(BrowserStore::new(StorageArea::Session)),
		}
	}

	/// Volatile stores for environments without browser storage.
	pub fn memory() -> Self {
		Self {
			local: Rc::new(MemoryStore::new()),
			session: Rc::new(MemoryStore::new()),
		}
	}
}

/// Which screen a [`GraphInstance`] shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ScreenContext {
	Milestones,
	Segment {
		segment: Segment,
		initial_page: usize,
	},
}

enum Screen {
	Milestones {
		milestones: Vec<Milestone>,
		segments: Vec<Segment>,
		viewport_store: ViewportStore,
		last_saved_viewport: Option<Viewport>,
	},
	Segment {
		credentials: Vec<Credential>,
		pagination: PaginationController,
	},
}

#[derive(Clone, Copy, Debug)]
struct DragState {
	node_index: usize,
	pointer_start: Point,
	node_start: Point,
}

#[derive(Clone, Copy, Debug)]
struct PanState {
	pointer_start: Point,
	viewport_start: Viewport,
}

#[derive(Clone, Copy, Debug, Default)]
struct Press {
	at: Point,
	moved: bool,
}

pub struct GraphInstance {
	key: GraphInstanceKey,
	config: TimelineConfig,
	screen: Screen,
	model: TimelineModel,
	/// Ids of the real (non-section) nodes, in traversal order.
	path_ids: Vec<String>,
	fitter: ViewportFitter,
	scheduler: FitScheduler,
	cursor: NavigationCursor,
	store: PositionStore,
	saved: PositionMap,
	remote: RemoteSync,
	viewport: ViewportAnimator,
	surface: Size,
	variant: Variant,
	layout_locked: bool,
	pan_enabled: bool,
	drag: Option<DragState>,
	pan: Option<PanState>,
	press: Option<Press>,
}

impl GraphInstance {
	pub fn for_context(
		context: &ScreenContext,
		data: &TimelineData,
		config: TimelineConfig,
		stores: &Stores,
		variant: Variant,
	) -> Self {
		match context {
			ScreenContext::Milestones => Self::milestones(data, config, stores, variant),
			ScreenContext::Segment {
				segment,
				initial_page,
			} => Self::segment(segment, &data.credentials, *initial_page, config, stores),
		}
	}

	/// The milestone overview: linear layout, pan + zoom fitting.
	pub fn milestones(data: &TimelineData, config: TimelineConfig, stores: &Stores, variant: Variant) -> Self {
		let key = GraphInstanceKey::Global;
		let store = PositionStore::new(stores.local.clone(), key, &config.storage.main_positions);
		let viewport_store = ViewportStore::new(stores.session.clone(), config.storage.main_viewport.clone());
		let restored = viewport_store.load();
		let screen = Screen::Milestones {
			milestones: data.milestones.clone(),
			segments: build_segments(&data.milestones, &data.credentials),
			viewport_store,
			last_saved_viewport: restored,
		};
		let fitter = ViewportFitter::new(FitMode::ViewportFit, config.fit.padding);
		let mut instance = Self::with_screen(key, config, screen, store, fitter, variant);
		if let Some(viewport) = restored {
			instance.viewport = ViewportAnimator::new(viewport);
		}
		instance
	}

	/// One segment: paginated snake layout, positions rescaled at a pinned zoom.
	pub fn segment(
		segment: &Segment,
		credentials: &[Credential],
		initial_page: usize,
		config: TimelineConfig,
		stores: &Stores,
	) -> Self {
		let key = GraphInstanceKey::for_segment(segment);
		let store = PositionStore::new(stores.local.clone(), key, &config.storage.segment_positions);
		let ordered = ordered_credentials(segment, credentials);
		let ids = ordered.iter().map(|c| c.id.clone()).collect();
		let screen = Screen::Segment {
			pagination: PaginationController::new(ids, config.page_size, initial_page),
			credentials: ordered,
		};
		let fitter = ViewportFitter::new(
			FitMode::LayoutRescale {
				zoom: config.fit.rescale_zoom,
			},
			config.fit.padding,
		);
		Self::with_screen(key, config, screen, store, fitter, Variant::Plain)
	}

	fn with_screen(
		key: GraphInstanceKey,
		config: TimelineConfig,
		screen: Screen,
		store: PositionStore,
		fitter: ViewportFitter,
		variant: Variant,
	) -> Self {
		let saved = store.load();
		let paginated = matches!(screen, Screen::Segment { .. });
		let mut instance = Self {
			key,
			scheduler: FitScheduler::new(config.scheduler.clone()),
			config,
			screen,
			model: GraphModel::default(),
			path_ids: Vec::new(),
			fitter,
			cursor: NavigationCursor::new(0, paginated),
			store,
			saved,
			remote: RemoteSync::default(),
			viewport: ViewportAnimator::default(),
			surface: Size::default(),
			variant,
			layout_locked: true,
			pan_enabled: false,
			drag: None,
			pan: None,
			press: None,
		};
		instance.rebuild();
		info!(
			"timeline-graph: instance {} with {} nodes, {} saved positions",
			instance.key,
			instance.model.nodes().len(),
			instance.saved.len()
		);
		instance
	}

	pub fn key(&self) -> GraphInstanceKey {
		self.key
	}

	pub fn model(&self) -> &TimelineModel {
		&self.model
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport.viewport()
	}

	pub fn surface(&self) -> Size {
		self.surface
	}

	pub fn saved_positions(&self) -> &PositionMap {
		&self.saved
	}

	pub fn remote_phase(&self) -> RemotePhase {
		self.remote.phase()
	}

	pub fn is_layout_locked(&self) -> bool {
		self.layout_locked
	}

	pub fn is_pan_enabled(&self) -> bool {
		self.pan_enabled
	}

	pub fn set_pan_enabled(&mut self, enabled: bool) {
		self.pan_enabled = enabled;
		if !enabled {
			self.pan = None;
		}
	}

	pub fn is_paginated(&self) -> bool {
		matches!(self.screen, Screen::Segment { .. })
	}

	pub fn current_index(&self) -> usize {
		self.cursor.current()
	}

	/// Current page of a segment screen.
	pub fn page(&self) -> Option<usize> {
		match &self.screen {
			Screen::Segment { pagination, .. } => Some(pagination.page()),
			Screen::Milestones { .. } => None,
		}
	}

	pub fn total_pages(&self) -> usize {
		match &self.screen {
			Screen::Segment { pagination, .. } => pagination.total_pages(),
			Screen::Milestones { .. } => 1,
		}
	}

	/// `(1-based position of the current node, total nodes)` across all pages.
	/// A screen without nodes reports `(0, 0)`.
	pub fn progress(&self) -> (usize, usize) {
		if self.cursor.is_empty() {
			return (0, 0);
		}
		match &self.screen {
			Screen::Segment { pagination, .. } => (
				pagination.page_start() + self.cursor.current() + 1,
				pagination.total_items(),
			),
			Screen::Milestones { milestones, .. } => (self.cursor.current() + 1, milestones.len()),
		}
	}

	fn size_hint(&self) -> Size {
		match self.screen {
			Screen::Milestones { .. } => self.config.size_hints.for_variant(self.variant),
			Screen::Segment { .. } => self.config.size_hints.plain,
		}
	}

	/// Positions for the current node set from saved > remote > generated.
	fn resolved_positions(&self) -> PositionMap {
		match &self.screen {
			Screen::Milestones { milestones, .. } => {
				let ids: Vec<&str> = milestones.iter().map(|m| m.id.as_str()).collect();
				let strategy = LayoutStrategy::Linear(self.config.linear.clone());
				resolve(&ids, &self.saved, self.remote.overrides(), &strategy)
			}
			Screen::Segment { pagination, .. } => pagination
				.build_page(&self.config.snake, &self.saved, self.remote.overrides())
				.slots
				.into_iter()
				.map(|slot| (slot.id, slot.position))
				.collect(),
		}
	}

	/// Replace the node and edge set for the current screen/page and reset navigation.
	fn rebuild(&mut self) {
		let size = self.size_hint();
		let draggable = !self.layout_locked;
		let node = |id: String, position: Point, payload: NodePayload| Node {
			id,
			position,
			size,
			draggable,
			is_current: false,
			payload,
		};

		let (nodes, edges, path_ids) = match &self.screen {
			Screen::Milestones {
				milestones,
				segments,
				..
			} => {
				let positions = self.resolved_positions();
				let nodes: Vec<_> = milestones
					.iter()
					.map(|m| {
						let position = positions.get(&m.id).copied().unwrap_or_default();
						node(m.id.clone(), position, NodePayload::Milestone(m.clone()))
					})
					.collect();
				let edges: Vec<_> = milestones
					.windows(2)
					.zip(segments)
					.map(|(pair, segment)| Edge {
						id: format!("seg-{}-{}", pair[0].id, pair[1].id),
						source_id: pair[0].id.clone(),
						target_id: pair[1].id.clone(),
						payload: EdgePayload::Segment(segment.clone()),
					})
					.collect();
				let path_ids: Vec<String> = milestones.iter().map(|m| m.id.clone()).collect();
				(nodes, edges, path_ids)
			}
			Screen::Segment {
				credentials,
				pagination,
			} => {
				let page =
					pagination.build_page(&self.config.snake, &self.saved, self.remote.overrides());
				let fraction = pagination.section_fraction();
				let path_ids: Vec<String> = page.item_ids().into_iter().map(String::from).collect();
				let nodes: Vec<_> = page
					.slots
					.into_iter()
					.filter_map(|slot| {
						let payload = match slot.kind {
							SlotKind::Item { index } => {
								let credential = credentials.get(index)?.clone();
								NodePayload::Credential {
									label: circle_label(&credential),
									credential,
									index,
								}
							}
							SlotKind::PreviousSection => NodePayload::PreviousSection {
								fraction: fraction.clone(),
							},
							SlotKind::NextSection => NodePayload::NextSection {
								fraction: fraction.clone(),
							},
						};
						Some(node(slot.id, slot.position, payload))
					})
					.collect();
				let edges: Vec<_> = page
					.links
					.into_iter()
					.map(|link| Edge {
						id: link.id,
						source_id: link.source_id,
						target_id: link.target_id,
						payload: EdgePayload::Path,
					})
					.collect();
				(nodes, edges, path_ids)
			}
		};

		self.model.initialize(nodes, edges);
		self.path_ids = path_ids;
		self.cursor.reset(self.path_ids.len());
		if let Some(first) = self.path_ids.first() {
			self.model.set_current(first);
		}
		self.drag = None;
	}

	/// Issue the initial fit once the surface is mounted. A screen returning
	/// to a restored viewport keeps it instead of fitting, so it does not jump.
	pub fn mount(&mut self, surface: Size, now_ms: f64) {
		self.surface = surface;
		let restored = matches!(
			self.screen,
			Screen::Milestones {
				last_saved_viewport: Some(_),
				..
			}
		);
		if !restored {
			self.scheduler.request_fit(now_ms);
		}
	}

	/// Container measured at a new size. The owner measures every frame, so a
	/// surface that settles after mount (or without a window resize) still
	/// gets a debounced refit against its real size.
	pub fn resize(&mut self, surface: Size, now_ms: f64) {
		if surface == self.surface {
			return;
		}
		self.surface = surface;
		self.scheduler.request_fit(now_ms);
	}

	/// Switch the decoration variant; node sizes change, so the set is rebuilt.
	pub fn set_variant(&mut self, variant: Variant, now_ms: f64) {
		if variant == self.variant {
			return;
		}
		self.variant = variant;
		let current = self.cursor.current();
		self.rebuild();
		if let NavStep::Moved(i) = self.cursor.go_to(current) {
			self.highlight(i);
		}
		self.scheduler.request_fit(now_ms);
	}

	/// Where the curated positions for this instance live.
	pub fn remote_url(&self) -> String {
		self.key
			.remote_path(&self.config.remote.main, &self.config.remote.segment_base)
	}

	/// Start fetching curated positions; pass the ticket back to
	/// [`GraphInstance::apply_remote`] with the result.
	pub fn begin_remote_fetch(&mut self) -> RemoteTicket {
		self.remote.begin()
	}

	/// Merge fetched curated positions. Nodes with a saved position keep it.
	/// Returns false when the result belongs to a superseded fetch.
	pub fn apply_remote(&mut self, ticket: RemoteTicket, overrides: PositionMap, now_ms: f64) -> bool {
		if !self.remote.accept(ticket, overrides) {
			return false;
		}
		let resolved = self.resolved_positions();
		let saved = &self.saved;
		let rescaled = self.is_paginated();
		let moved = self
			.model
			.apply_positions(&resolved, |id| rescaled || !saved.contains_key(id));
		debug!(
			"timeline-graph: remote positions for {} moved {} nodes",
			self.key, moved
		);
		if moved > 0 {
			self.scheduler.request_fit_retrying(now_ms);
		}
		self.remote.settle();
		true
	}

	fn highlight(&mut self, index: usize) {
		if let Some(id) = self.path_ids.get(index) {
			let id = id.clone();
			self.model.set_current(&id);
		}
	}

	fn handle_step(&mut self, step: NavStep, now_ms: f64, animated: bool) {
		match step {
			NavStep::Moved(i) => {
				self.highlight(i);
				self.scheduler.request_navigation_fit(now_ms, animated);
			}
			NavStep::AdvancePage => {
				self.change_page(true, now_ms);
			}
			NavStep::RetreatPage => {
				self.change_page(false, now_ms);
			}
			NavStep::Stay => {}
		}
	}

	pub fn next(&mut self, now_ms: f64) {
		let step = self.cursor.next();
		self.handle_step(step, now_ms, true);
	}

	pub fn prev(&mut self, now_ms: f64) {
		let step = self.cursor.prev();
		self.handle_step(step, now_ms, true);
	}

	/// Jump to the `index`-th node of the path.
	pub fn go_to(&mut self, index: usize, now_ms: f64) {
		let step = self.cursor.go_to(index);
		self.handle_step(step, now_ms, false);
	}

	/// Move one page forwards or backwards. Pending fits for the old page
	/// are dropped and a retrying fit is issued for the new one.
	pub fn change_page(&mut self, forward: bool, now_ms: f64) -> bool {
		let Screen::Segment { pagination, .. } = &mut self.screen else {
			return false;
		};
		let changed = if forward {
			pagination.advance()
		} else {
			pagination.retreat()
		};
		if !changed {
			return false;
		}
		info!(
			"timeline-graph: {} page {}",
			self.key,
			pagination.section_fraction()
		);
		self.scheduler.cancel_all();
		self.rebuild();
		self.scheduler.request_fit_retrying(now_ms);
		true
	}

	/// Handle a click on node `id`. Section nodes change page; real nodes
	/// become current and are reported outward.
	pub fn click_node(&mut self, id: &str, now_ms: f64) -> Option<GraphEvent> {
		if id == NEXT_SECTION_ID && self.is_paginated() {
			self.change_page(true, now_ms);
			return None;
		}
		if id == PREVIOUS_SECTION_ID && self.is_paginated() {
			self.change_page(false, now_ms);
			return None;
		}
		let index = self.path_ids.iter().position(|p| p == id)?;
		self.go_to(index, now_ms);
		let payload = self.model.node(id)?.payload.clone();
		Some(GraphEvent::NodeClicked {
			id: id.to_string(),
			payload,
			page: self.page(),
		})
	}

	pub fn click_edge(&self, id: &str) -> Option<GraphEvent> {
		let edge = self.model.edge(id)?;
		Some(GraphEvent::EdgeClicked {
			id: edge.id.clone(),
			payload: edge.payload.clone(),
		})
	}

	/// Persist the current positions and freeze dragging.
	pub fn lock_layout(&mut self) {
		let positions = self.model.positions();
		self.saved = if self.is_paginated() {
			self.store.merge_save(&positions)
		} else {
			self.store.save(&positions)
		};
		self.layout_locked = true;
		self.model.lock_draggable(true);
		info!(
			"timeline-graph: locked layout {} ({} positions)",
			self.store.key(),
			self.saved.len()
		);
	}

	pub fn unlock_layout(&mut self) {
		self.layout_locked = false;
		self.model.lock_draggable(false);
	}

	/// Forget saved positions and fall back to curated/generated ones.
	pub fn reset_layout(&mut self, now_ms: f64) {
		self.store.clear();
		self.saved.clear();
		let resolved = self.resolved_positions();
		self.model.apply_positions(&resolved, |_| true);
		self.scheduler.request_fit_retrying(now_ms);
	}

	/// Pointer pressed at a screen position. Starts a drag on a draggable
	/// node, otherwise a pan when panning is enabled.
	pub fn pointer_down(&mut self, screen: Point) {
		self.press = Some(Press {
			at: screen,
			moved: false,
		});
		let viewport = self.viewport.viewport();
		let world = viewport.screen_to_graph(screen.x, screen.y);
		let hit = self
			.model
			.node_at(world)
			.filter(|n| n.draggable)
			.map(|n| n.id.clone());
		if let Some(id) = hit {
			if let Some(node_index) = self.model.nodes().iter().position(|n| n.id == id) {
				self.drag = Some(DragState {
					node_index,
					pointer_start: screen,
					node_start: self.model.nodes()[node_index].position,
				});
			}
		} else if self.pan_enabled {
			self.pan = Some(PanState {
				pointer_start: screen,
				viewport_start: viewport,
			});
		}
	}

	/// Pointer moved. Positions follow the pointer delta from the press.
	pub fn pointer_move(&mut self, screen: Point) {
		if let Some(press) = self.press.as_mut() {
			let (dx, dy) = (screen.x - press.at.x, screen.y - press.at.y);
			if (dx * dx + dy * dy).sqrt() > CLICK_SLOP {
				press.moved = true;
			}
		}
		if let Some(drag) = self.drag {
			let zoom = self.viewport.viewport().zoom;
			let position = Point::new(
				drag.node_start.x + (screen.x - drag.pointer_start.x) / zoom,
				drag.node_start.y + (screen.y - drag.pointer_start.y) / zoom,
			);
			if let Some(id) = self.model.nodes().get(drag.node_index).map(|n| n.id.clone()) {
				self.model.update_node_position(&id, position);
			}
		} else if let Some(pan) = self.pan {
			let viewport = Viewport {
				pan_x: pan.viewport_start.pan_x + (screen.x - pan.pointer_start.x),
				pan_y: pan.viewport_start.pan_y + (screen.y - pan.pointer_start.y),
				zoom: pan.viewport_start.zoom,
			};
			self.viewport.set_viewport(viewport, Transition::INSTANT);
		}
	}

	/// Pointer released. A press that did not travel is a click on whatever
	/// node or edge lies under it.
	pub fn pointer_up(&mut self, screen: Point, now_ms: f64) -> Option<GraphEvent> {
		let press = self.press.take();
		self.drag = None;
		self.pan = None;
		press.filter(|p| !p.moved)?;
		let viewport = self.viewport.viewport();
		let world = viewport.screen_to_graph(screen.x, screen.y);
		if let Some(id) = self.model.node_at(world).map(|n| n.id.clone()) {
			return self.click_node(&id, now_ms);
		}
		let tolerance = EDGE_HIT_PX / viewport.zoom;
		let edge_id = self.model.edge_at(world, tolerance).map(|e| e.id.clone())?;
		self.click_edge(&edge_id)
	}

	/// Pointer left the surface: abandon any drag or pan.
	pub fn pointer_leave(&mut self) {
		self.press = None;
		self.drag = None;
		self.pan = None;
	}

	/// Wheel zoom around the cursor. Only the pan + zoom screen zooms; the
	/// rescaled screen keeps its pinned zoom.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		if !matches!(self.fitter.mode, FitMode::ViewportFit) {
			return;
		}
		let v = self.viewport.viewport();
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let zoom = (v.zoom * factor).clamp(self.config.fit.min_zoom, self.config.fit.max_zoom);
		let ratio = zoom / v.zoom;
		self.viewport.set_viewport(
			Viewport {
				pan_x: screen.x - (screen.x - v.pan_x) * ratio,
				pan_y: screen.y - (screen.y - v.pan_y) * ratio,
				zoom,
			},
			Transition::INSTANT,
		);
	}

	/// Per-frame update: runs a due fit, advances the viewport animation
	/// and persists a settled viewport. Returns the fit outcome if one ran.
	pub fn tick(&mut self, now_ms: f64) -> Option<FitOutcome> {
		self.viewport.advance(now_ms);
		let mut outcome = None;
		if let Some(trigger) = self.scheduler.on_frame(now_ms) {
			let transition = match trigger {
				FitTrigger::Navigate => {
					Transition::animated(self.config.fit.navigation_duration_ms)
				}
				FitTrigger::Layout | FitTrigger::Select => Transition::INSTANT,
			};
			let hint = self.size_hint();
			outcome = Some(self.fitter.fit(
				&mut self.model,
				self.surface,
				hint,
				&mut self.viewport,
				transition,
			));
		}
		self.persist_viewport();
		outcome
	}

	fn persist_viewport(&mut self) {
		// Only settled viewports are worth restoring.
		if self.viewport.is_animating() || self.pan.is_some() || !self.scheduler.is_idle() {
			return;
		}
		let current = self.viewport.viewport();
		if let Screen::Milestones {
			viewport_store,
			last_saved_viewport,
			..
		} = &mut self.screen
		{
			if *last_saved_viewport != Some(current) {
				viewport_store.save(&current);
				*last_saved_viewport = Some(current);
			}
		}
	}

	/// Drop pending fits and in-flight fetches before the context goes away.
	pub fn teardown(&mut self) {
		self.scheduler.cancel_all();
		self.remote.cancel();
		self.pointer_leave();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::timeline_graph::fit::bounding_box;

	fn data() -> TimelineData {
		serde_json::from_str(
			r#"{
				"milestones": [
					{ "id": "a", "year": 1991, "label": "Start" },
					{ "id": "b", "year": 2003, "label": "Degree" },
					{ "id": "c", "year": 2010, "label": "Masters" }
				],
				"credentials": [
					{ "id": "c1", "numericId": 1, "year": 1991 },
					{ "id": "c2", "numericId": 2, "year": 1995 },
					{ "id": "c3", "numericId": 3, "year": 2003 },
					{ "id": "c4", "numericId": 4, "year": 2008 }
				]
			}"#,
		)
		.unwrap()
	}

	fn long_segment(n: usize) -> (Segment, Vec<Credential>) {
		let credentials: Vec<Credential> = (0..n)
			.map(|i| Credential {
				id: format!("k{i}"),
				numeric_id: i as i64,
				title: String::new(),
				year: 2000 + i as i32,
				date: None,
				institution: String::new(),
			})
			.collect();
		let segment = Segment {
			from_year: 2000,
			to_year: 2020,
			credential_ids: credentials.iter().map(|c| c.id.clone()).collect(),
		};
		(segment, credentials)
	}

	fn run_until_idle(instance: &mut GraphInstance, from: f64) -> (f64, usize) {
		let mut t = from;
		let mut fits = 0;
		for _ in 0..200 {
			if let Some(FitOutcome::Fitted(_)) = instance.tick(t) {
				fits += 1;
			}
			t += 16.0;
		}
		(t, fits)
	}

	#[test]
	fn milestone_screen_links_milestones_through_segments() {
		let instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		let model = instance.model();
		assert_eq!(model.nodes().len(), 3);
		assert_eq!(model.edges().len(), 2);
		assert_eq!(model.current().map(|n| n.id.as_str()), Some("a"));
		let EdgePayload::Segment(first) = &model.edges()[0].payload else {
			panic!("milestone edges carry segments");
		};
		assert_eq!(first.credential_ids, vec!["c1", "c2", "c3"]);
		assert_eq!(model.edges()[0].payload.label().as_deref(), Some("3 credentials"));
		assert_eq!(model.edges()[1].payload.label().as_deref(), Some("1 credential"));
	}

	#[test]
	fn mount_fits_viewport_without_moving_nodes() {
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		let before = instance.model().positions();
		instance.mount(Size::new(1200.0, 800.0), 0.0);
		let (_, fits) = run_until_idle(&mut instance, 0.0);
		assert_eq!(fits, 1);
		assert_eq!(instance.model().positions(), before);
		assert!(instance.viewport().zoom > 1.0);
	}

	#[test]
	fn restored_viewport_skips_mount_fit() {
		let stores = Stores::memory();
		let mut first =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &stores, Variant::Plain);
		first.mount(Size::new(1200.0, 800.0), 0.0);
		run_until_idle(&mut first, 0.0);
		let fitted = first.viewport();
		first.teardown();

		let mut second =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &stores, Variant::Plain);
		assert_eq!(second.viewport(), fitted);
		second.mount(Size::new(1200.0, 800.0), 0.0);
		let (_, fits) = run_until_idle(&mut second, 0.0);
		assert_eq!(fits, 0);
	}

	#[test]
	fn decorated_variant_uses_taller_hint() {
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		instance.mount(Size::new(1200.0, 800.0), 0.0);
		run_until_idle(&mut instance, 0.0);
		let plain_zoom = instance.viewport().zoom;

		instance.set_variant(Variant::Decorated, 10_000.0);
		assert!(instance.model().nodes().iter().all(|n| n.size.height == 280.0));
		run_until_idle(&mut instance, 10_000.0);
		assert!(instance.viewport().zoom <= plain_zoom);
	}

	#[test]
	fn navigation_walks_pages_of_a_segment() {
		let (segment, credentials) = long_segment(10);
		let mut instance =
			GraphInstance::segment(&segment, &credentials, 0, TimelineConfig::default(), &Stores::memory());
		instance.mount(Size::new(1000.0, 700.0), 0.0);
		assert_eq!(instance.total_pages(), 2);
		assert_eq!(instance.progress(), (1, 10));

		let mut t = 0.0;
		for _ in 0..6 {
			instance.next(t);
			t += 10.0;
		}
		assert_eq!(instance.progress(), (7, 10));
		assert_eq!(instance.model().current().map(|n| n.id.as_str()), Some("k6"));

		instance.next(t);
		assert_eq!(instance.page(), Some(1));
		assert_eq!(instance.progress(), (8, 10));
		assert!(instance.model().node(PREVIOUS_SECTION_ID).is_some());
		assert!(instance.model().node(NEXT_SECTION_ID).is_none());

		instance.prev(t);
		assert_eq!(instance.page(), Some(0));
		assert_eq!(instance.current_index(), 0);
	}

	#[test]
	fn section_node_click_changes_page_without_event() {
		let (segment, credentials) = long_segment(10);
		let mut instance =
			GraphInstance::segment(&segment, &credentials, 0, TimelineConfig::default(), &Stores::memory());
		assert_eq!(instance.click_node(NEXT_SECTION_ID, 0.0), None);
		assert_eq!(instance.page(), Some(1));

		let event = instance.click_node("k8", 5.0);
		let Some(GraphEvent::NodeClicked { id, page, .. }) = event else {
			panic!("expected a node click, got {event:?}");
		};
		assert_eq!(id, "k8");
		assert_eq!(page, Some(1));
		assert_eq!(instance.current_index(), 1);
	}

	#[test]
	fn segment_fit_rescales_into_surface() {
		let (segment, credentials) = long_segment(7);
		let mut instance =
			GraphInstance::segment(&segment, &credentials, 0, TimelineConfig::default(), &Stores::memory());
		instance.mount(Size::new(1000.0, 700.0), 0.0);
		run_until_idle(&mut instance, 0.0);
		let bounds = bounding_box(instance.model().nodes(), Size::new(100.0, 100.0)).unwrap();
		assert!(bounds.min_x >= 0.0 && bounds.max_x <= 1000.0);
		assert!(bounds.min_y >= 0.0 && bounds.max_y <= 700.0);
		assert_eq!(instance.viewport().zoom, 1.0);
	}

	#[test]
	fn lock_merges_into_saved_segment_positions() {
		let (segment, credentials) = long_segment(3);
		let stores = Stores::memory();
		let mut instance =
			GraphInstance::segment(&segment, &credentials, 0, TimelineConfig::default(), &stores);
		instance.unlock_layout();
		assert!(instance.model().nodes().iter().all(|n| n.draggable));

		// Drag k1 by (30, 40) at zoom 1.
		let k1 = instance.model().node("k1").unwrap().position;
		instance.pointer_down(Point::new(k1.x + 10.0, k1.y + 10.0));
		instance.pointer_move(Point::new(k1.x + 40.0, k1.y + 50.0));
		assert_eq!(instance.pointer_up(Point::new(k1.x + 40.0, k1.y + 50.0), 0.0), None);
		assert_eq!(
			instance.model().node("k1").unwrap().position,
			Point::new(k1.x + 30.0, k1.y + 40.0)
		);

		instance.lock_layout();
		assert!(instance.model().nodes().iter().all(|n| !n.draggable));

		let reopened =
			GraphInstance::segment(&segment, &credentials, 0, TimelineConfig::default(), &stores);
		assert_eq!(
			reopened.model().node("k1").unwrap().position,
			Point::new(k1.x + 30.0, k1.y + 40.0)
		);
	}

	#[test]
	fn remote_positions_skip_saved_nodes_and_trigger_retrying_fit() {
		let stores = Stores::memory();
		stores
			.local
			.set("timeline-main-positions", r#"{"a": {"x": 1, "y": 2}}"#)
			.unwrap();
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &stores, Variant::Plain);
		let ticket = instance.begin_remote_fetch();
		assert_eq!(instance.remote_phase(), RemotePhase::AwaitingRemote);

		let remote: PositionMap = [
			("a".to_string(), Point::new(500.0, 500.0)),
			("b".to_string(), Point::new(10.0, 20.0)),
		]
		.into();
		assert!(instance.apply_remote(ticket, remote, 0.0));
		assert_eq!(instance.remote_phase(), RemotePhase::Settled);
		assert_eq!(instance.model().node("a").unwrap().position, Point::new(1.0, 2.0));
		assert_eq!(instance.model().node("b").unwrap().position, Point::new(10.0, 20.0));
		assert_eq!(instance.model().node("c").unwrap().position, Point::new(440.0, 120.0));
	}

	#[test]
	fn teardown_discards_late_remote_result() {
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		let ticket = instance.begin_remote_fetch();
		instance.teardown();
		let remote: PositionMap = [("b".to_string(), Point::new(10.0, 20.0))].into();
		assert!(!instance.apply_remote(ticket, remote, 0.0));
		assert_eq!(instance.model().node("b").unwrap().position, Point::new(220.0, 120.0));
	}

	#[test]
	fn late_surface_gets_fitted_once_measured() {
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		instance.mount(Size::new(0.0, 0.0), 0.0);
		let ticket = instance.begin_remote_fetch();
		let remote: PositionMap = [("b".to_string(), Point::new(300.0, 300.0))].into();
		assert!(instance.apply_remote(ticket, remote, 0.0));
		let (t, fits) = run_until_idle(&mut instance, 0.0);
		assert_eq!(fits, 0);
		assert_eq!(instance.viewport(), Viewport::default());

		instance.resize(Size::new(1000.0, 700.0), t);
		let (_, fits) = run_until_idle(&mut instance, t);
		assert_eq!(fits, 1);
		assert_eq!(instance.surface(), Size::new(1000.0, 700.0));
		assert_ne!(instance.viewport(), Viewport::default());
	}

	#[test]
	fn resize_refits_once_and_ignores_same_size() {
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		instance.mount(Size::new(1200.0, 800.0), 0.0);
		let (t, _) = run_until_idle(&mut instance, 0.0);
		let before = instance.viewport();

		instance.resize(Size::new(1200.0, 800.0), t);
		let (t, fits) = run_until_idle(&mut instance, t);
		assert_eq!(fits, 0);
		assert_eq!(instance.viewport(), before);

		// Two measurements inside the debounce window coalesce.
		instance.resize(Size::new(700.0, 500.0), t);
		instance.resize(Size::new(600.0, 400.0), t + 16.0);
		let (_, fits) = run_until_idle(&mut instance, t + 16.0);
		assert_eq!(fits, 1);
		assert!(instance.viewport().zoom < before.zoom);
	}

	#[test]
	fn page_change_drops_pending_navigation_fit() {
		let (segment, credentials) = long_segment(10);
		let mut instance =
			GraphInstance::segment(&segment, &credentials, 0, TimelineConfig::default(), &Stores::memory());
		instance.mount(Size::new(1000.0, 700.0), 0.0);
		let (t, _) = run_until_idle(&mut instance, 0.0);

		// Navigation fit due at t + 50, page switched before it runs.
		instance.next(t);
		let switched = t + 16.0;
		assert!(instance.change_page(true, switched));
		assert_eq!(instance.page(), Some(1));

		let mut ran = Vec::new();
		let mut now = switched + 16.0;
		for _ in 0..40 {
			if instance.tick(now).is_some() {
				ran.push(now - switched);
			}
			now += 16.0;
		}
		// Only the new page's retry attempts (50 ms and 220 ms after a
		// two-frame wait) run.
		assert_eq!(ran, vec![96.0, 256.0]);
	}

	#[test]
	fn empty_screen_reports_no_progress() {
		let instance = GraphInstance::milestones(
			&TimelineData::default(),
			TimelineConfig::default(),
			&Stores::memory(),
			Variant::Plain,
		);
		assert_eq!(instance.progress(), (0, 0));

		let (segment, _) = long_segment(3);
		let instance =
			GraphInstance::segment(&segment, &[], 0, TimelineConfig::default(), &Stores::memory());
		assert_eq!(instance.progress(), (0, 0));
	}

	#[test]
	fn edge_click_reports_segment() {
		let mut instance =
			GraphInstance::milestones(&data(), TimelineConfig::default(), &Stores::memory(), Variant::Plain);
		// At zoom 1 with no pan, the a-b edge runs along y = 170 between node centres.
		instance.pointer_down(Point::new(160.0, 170.0));
		let event = instance.pointer_up(Point::new(160.0, 170.0), 0.0);
		let Some(GraphEvent::EdgeClicked { id, payload }) = event else {
			panic!("expected an edge click, got {event:?}");
		};
		assert_eq!(id, "seg-a-b");
		assert!(matches!(payload, EdgePayload::Segment(_)));
	}
}
