//! Fits a node set into the visible area.
//!
//! Both modes share the same first steps: a bounding box over node positions
//! plus a footprint size hint, rejection of degenerate scenes, and a scale
//! leaving `1 - padding` of the viewport as margin. They differ in what gets
//! written:
//!
//! - [`FitMode::ViewportFit`] leaves nodes alone and sets pan + zoom so the box
//!   is centred at `zoom = scale`.
//! - [`FitMode::LayoutRescale`] pins the zoom and rewrites node positions into
//!   viewport space. The node footprint does not scale at a pinned zoom, so
//!   the scale is solved for the position span: the fitted box then fills
//!   `viewport * padding` on its tighter axis and a second fit is a no-op.
//!
//! Degenerate input (no nodes, zero-area viewport or box) is a silent no-op.

use log::debug;

use super::graph::GraphModel;
use super::types::{BoundingBox, Node, Point, Size, Viewport};

/// What a fit rewrites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitMode {
	/// Pan + zoom only.
	ViewportFit,
	/// Rewrite node positions at a pinned zoom.
	LayoutRescale { zoom: f64 },
}

/// How a viewport change is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
	pub duration_ms: u32,
}

impl Transition {
	pub const INSTANT: Transition = Transition { duration_ms: 0 };

	pub fn animated(duration_ms: u32) -> Self {
		Self { duration_ms }
	}
}

/// Consumer of viewport transforms (the rendering surface).
pub trait ViewportSink {
	fn viewport(&self) -> Viewport;
	fn set_viewport(&mut self, viewport: Viewport, transition: Transition);
}

/// Why a fit did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
	EmptyGraph,
	DegenerateViewport,
	DegenerateBounds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitOutcome {
	Skipped(SkipReason),
	Fitted(Viewport),
}

/// Bounding box of `nodes` with every node occupying `hint` from its position.
pub fn bounding_box<T>(nodes: &[Node<T>], hint: Size) -> Option<BoundingBox> {
	let first = nodes.first()?;
	let init = BoundingBox {
		min_x: first.position.x,
		min_y: first.position.y,
		max_x: first.position.x + hint.width,
		max_y: first.position.y + hint.height,
	};
	Some(nodes.iter().skip(1).fold(init, |b, n| BoundingBox {
		min_x: b.min_x.min(n.position.x),
		min_y: b.min_y.min(n.position.y),
		max_x: b.max_x.max(n.position.x + hint.width),
		max_y: b.max_y.max(n.position.y + hint.height),
	}))
}

/// Computed fit, before anything is written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitPlan {
	Viewport(Viewport),
	Rescale {
		scale: f64,
		origin: Point,
		offset: Point,
		viewport: Viewport,
	},
}

impl FitPlan {
	pub fn viewport(&self) -> Viewport {
		match self {
			FitPlan::Viewport(v) => *v,
			FitPlan::Rescale { viewport, .. } => *viewport,
		}
	}

	/// Where a position lands once the plan is applied.
	pub fn map_point(&self, p: Point) -> Point {
		match self {
			FitPlan::Viewport(_) => p,
			FitPlan::Rescale {
				scale,
				origin,
				offset,
				..
			} => Point::new(
				(p.x - origin.x) * scale + offset.x,
				(p.y - origin.y) * scale + offset.y,
			),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportFitter {
	pub mode: FitMode,
	/// Fraction of the viewport the fitted box may occupy.
	pub padding: f64,
}

impl ViewportFitter {
	pub fn new(mode: FitMode, padding: f64) -> Self {
		Self { mode, padding }
	}

	/// Compute the fit of `nodes` into `viewport` without applying it.
	pub fn plan<T>(&self, nodes: &[Node<T>], viewport: Size, hint: Size) -> Result<FitPlan, SkipReason> {
		if nodes.is_empty() {
			return Err(SkipReason::EmptyGraph);
		}
		if viewport.is_degenerate() {
			return Err(SkipReason::DegenerateViewport);
		}
		let bounds = bounding_box(nodes, hint).ok_or(SkipReason::EmptyGraph)?;
		let (box_w, box_h) = (bounds.width(), bounds.height());
		if !(box_w > 0.0 && box_h > 0.0) {
			return Err(SkipReason::DegenerateBounds);
		}
		let box_scale = (viewport.width / box_w).min(viewport.height / box_h) * self.padding;

		match self.mode {
			FitMode::ViewportFit => {
				let center = bounds.center();
				Ok(FitPlan::Viewport(Viewport {
					pan_x: viewport.width / 2.0 - center.x * box_scale,
					pan_y: viewport.height / 2.0 - center.y * box_scale,
					zoom: box_scale,
				}))
			}
			FitMode::LayoutRescale { zoom } => {
				let span = Size::new(box_w - hint.width, box_h - hint.height);
				let scale = self
					.span_scale(span, viewport, hint)
					.unwrap_or(box_scale);
				let fitted = Size::new(span.width * scale + hint.width, span.height * scale + hint.height);
				Ok(FitPlan::Rescale {
					scale,
					origin: Point::new(bounds.min_x, bounds.min_y),
					offset: Point::new(
						(viewport.width - fitted.width) / 2.0,
						(viewport.height - fitted.height) / 2.0,
					),
					viewport: Viewport {
						pan_x: 0.0,
						pan_y: 0.0,
						zoom,
					},
				})
			}
		}
	}

	/// Scale for the position span so span * scale + hint fills the padded
	/// viewport on the tighter axis. `None` when the padded viewport cannot
	/// hold a single node footprint.
	fn span_scale(&self, span: Size, viewport: Size, hint: Size) -> Option<f64> {
		let avail_w = viewport.width * self.padding - hint.width;
		let avail_h = viewport.height * self.padding - hint.height;
		if avail_w <= 0.0 || avail_h <= 0.0 {
			return None;
		}
		let candidates = [(span.width, avail_w), (span.height, avail_h)];
		let scale = candidates
			.iter()
			.filter(|(s, _)| *s > f64::EPSILON)
			.map(|(s, avail)| avail / s)
			.fold(f64::INFINITY, f64::min);
		Some(if scale.is_finite() { scale } else { 1.0 })
	}

	/// Fit `model` into `viewport`, writing positions (rescale mode) and the
	/// viewport through `sink`.
	pub fn fit<T, U>(
		&self,
		model: &mut GraphModel<T, U>,
		viewport: Size,
		hint: Size,
		sink: &mut dyn ViewportSink,
		transition: Transition,
	) -> FitOutcome {
		let plan = match self.plan(model.nodes(), viewport, hint) {
			Ok(plan) => plan,
			Err(reason) => {
				debug!("timeline-graph: fit skipped ({:?})", reason);
				return FitOutcome::Skipped(reason);
			}
		};
		if let FitPlan::Rescale { .. } = plan {
			model.map_positions(|p| plan.map_point(p));
		}
		let target = plan.viewport();
		sink.set_viewport(target, transition);
		FitOutcome::Fitted(target)
	}
}

/// Ease-in-out curve on `[0, 1]`.
fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

#[derive(Clone, Copy, Debug)]
struct Tween {
	from: Viewport,
	to: Viewport,
	start_ms: f64,
	duration_ms: f64,
}

/// Viewport sink that tweens towards each new target.
///
/// Time only advances through [`ViewportAnimator::advance`], so the animator
/// is deterministic under test.
#[derive(Clone, Debug, Default)]
pub struct ViewportAnimator {
	current: Viewport,
	tween: Option<Tween>,
	now_ms: f64,
}

impl ViewportAnimator {
	pub fn new(viewport: Viewport) -> Self {
		Self {
			current: viewport,
			..Self::default()
		}
	}

	pub fn is_animating(&self) -> bool {
		self.tween.is_some()
	}

	/// Final viewport once any running transition completes.
	pub fn target(&self) -> Viewport {
		self.tween.map(|t| t.to).unwrap_or(self.current)
	}

	/// Advance the clock, returning the viewport to draw.
	pub fn advance(&mut self, now_ms: f64) -> Viewport {
		self.now_ms = now_ms;
		if let Some(tween) = self.tween {
			let t = ((now_ms - tween.start_ms) / tween.duration_ms).clamp(0.0, 1.0);
			let e = smooth_step(t);
			let lerp = |a: f64, b: f64| a + (b - a) * e;
			self.current = Viewport {
				pan_x: lerp(tween.from.pan_x, tween.to.pan_x),
				pan_y: lerp(tween.from.pan_y, tween.to.pan_y),
				zoom: lerp(tween.from.zoom, tween.to.zoom),
			};
			if t >= 1.0 {
				self.current = tween.to;
				self.tween = None;
			}
		}
		self.current
	}
}

impl ViewportSink for ViewportAnimator {
	fn viewport(&self) -> Viewport {
		self.current
	}

	fn set_viewport(&mut self, viewport: Viewport, transition: Transition) {
		if transition.duration_ms == 0 {
			self.current = viewport;
			self.tween = None;
		} else {
			self.tween = Some(Tween {
				from: self.current,
				to: viewport,
				start_ms: self.now_ms,
				duration_ms: transition.duration_ms as f64,
			});
		}
	}
}
