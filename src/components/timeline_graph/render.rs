//! Canvas rendering for the timeline.
//!
//! Draws one [`GraphInstance`] per frame in three passes for correct
//! z-ordering:
//! 1. Background (screen space)
//! 2. Edges, then edge labels (world space)
//! 3. Nodes, with the current node's ring and labels on top

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::instance::{EdgePayload, GraphInstance, NodePayload, TimelineModel};
use super::theme::Theme;
use super::types::{Node, Point, Size, Viewport};

/// Renders the complete screen to the canvas.
pub fn render(instance: &GraphInstance, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let surface = instance.surface();
	let viewport = instance.viewport();
	draw_background(ctx, surface, theme);

	ctx.save();
	let _ = ctx.translate(viewport.pan_x, viewport.pan_y);
	let _ = ctx.scale(viewport.zoom, viewport.zoom);

	draw_edges(instance.model(), ctx, &viewport, theme);
	draw_nodes(instance.model(), ctx, &viewport, theme, !instance.is_layout_locked());

	ctx.restore();
}

fn draw_background(ctx: &CanvasRenderingContext2d, surface: Size, theme: &Theme) {
	let (w, h) = (surface.width, surface.height);
	let gradient = theme
		.background
		.use_gradient
		.then(|| ctx.create_radial_gradient(w / 2.0, h / 2.0, 0.0, w / 2.0, h / 2.0, w.max(h) * 0.8))
		.and_then(Result::ok);

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&theme.background.color.to_css()),
	}

	ctx.fill_rect(0.0, 0.0, w, h);
}

fn draw_edges(model: &TimelineModel, ctx: &CanvasRenderingContext2d, viewport: &Viewport, theme: &Theme) {
	// Line widths stay constant on screen.
	let k = viewport.zoom;
	let solid = js_sys::Array::new();
	let dashed = js_sys::Array::of2(
		&JsValue::from_f64(theme.edge.dash.0 / k),
		&JsValue::from_f64(theme.edge.dash.1 / k),
	);

	let mut labels = Vec::new();
	for edge in model.edges() {
		let (Some(a), Some(b)) = (model.anchor(&edge.source_id), model.anchor(&edge.target_id)) else {
			continue;
		};
		match &edge.payload {
			EdgePayload::Segment(_) => {
				ctx.set_stroke_style_str(&theme.edge.segment_color.to_css());
				let _ = ctx.set_line_dash(&solid);
			}
			EdgePayload::Path => {
				ctx.set_stroke_style_str(&theme.edge.color.to_css());
				let _ = ctx.set_line_dash(&dashed);
			}
		}
		ctx.set_line_width(theme.edge.width / k);
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();

		if let Some(label) = edge.payload.label() {
			labels.push((Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0), label));
		}
	}
	let _ = ctx.set_line_dash(&solid);

	ctx.set_font(theme.node.label_font);
	ctx.set_text_align("center");
	ctx.set_text_baseline("bottom");
	ctx.set_fill_style_str(&theme.edge.label_color.to_css());
	for (at, label) in labels {
		let _ = ctx.fill_text(&label, at.x, at.y - 8.0);
	}
}

fn draw_nodes(
	model: &TimelineModel,
	ctx: &CanvasRenderingContext2d,
	viewport: &Viewport,
	theme: &Theme,
	editing: bool,
) {
	// Current node last so its ring sits on top.
	let (current, rest): (Vec<_>, Vec<_>) = model.nodes().iter().partition(|n| n.is_current);
	for node in rest.into_iter().chain(current) {
		if node.payload.is_section() {
			draw_section(ctx, node, viewport, theme);
		} else {
			draw_circle(ctx, node, viewport, theme, editing);
		}
	}
}

/// Circle inscribed at the top of the node footprint.
fn circle_geometry(node: &Node<NodePayload>) -> (Point, f64) {
	let radius = node.size.width.min(node.size.height) / 2.0;
	let center = Point::new(node.position.x + node.size.width / 2.0, node.position.y + radius);
	(center, radius)
}

fn draw_circle(
	ctx: &CanvasRenderingContext2d,
	node: &Node<NodePayload>,
	viewport: &Viewport,
	theme: &Theme,
	editing: bool,
) {
	let (c, radius) = circle_geometry(node);
	let k = viewport.zoom;
	let base = theme.node.fill;

	let gradient = theme
		.node
		.use_gradient
		.then(|| ctx.create_radial_gradient(c.x - radius * 0.3, c.y - radius * 0.3, 0.0, c.x, c.y, radius))
		.and_then(Result::ok);
	ctx.begin_path();
	let _ = ctx.arc(c.x, c.y, radius, 0.0, 2.0 * PI);
	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &base.lighten(0.4).to_css());
			let _ = gradient.add_color_stop(0.7, &base.to_css());
			let _ = gradient.add_color_stop(1.0, &base.darken(0.2).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&base.to_css()),
	}
	ctx.fill();

	if node.is_current {
		ctx.begin_path();
		let _ = ctx.arc(c.x, c.y, radius + theme.node.ring_width / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&theme.node.current_ring.to_css());
		ctx.set_line_width(theme.node.ring_width / k);
		ctx.stroke();
	}

	if editing && node.draggable {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(4.0 / k),
			&JsValue::from_f64(4.0 / k),
		));
		ctx.set_stroke_style_str(&theme.node.edit_border.to_css());
		ctx.set_line_width(1.0 / k);
		ctx.stroke_rect(node.position.x, node.position.y, node.size.width, node.size.height);
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}

	ctx.set_font(theme.node.label_font);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&theme.node.label_color.to_css());
	let _ = ctx.fill_text(&node.payload.label(), c.x, c.y);

	if let NodePayload::Milestone(milestone) = &node.payload {
		ctx.set_text_baseline("top");
		let _ = ctx.fill_text(&milestone.year.to_string(), c.x, c.y + radius + 10.0 / k);
	}
}

/// Pill spanning the node footprint, used for page transitions.
fn draw_section(ctx: &CanvasRenderingContext2d, node: &Node<NodePayload>, viewport: &Viewport, theme: &Theme) {
	let (c, radius) = circle_geometry(node);
	let half = radius * 0.5;
	let (left, right) = (node.position.x + half, node.position.x + node.size.width - half);

	ctx.begin_path();
	let _ = ctx.arc(left, c.y, half, PI / 2.0, 3.0 * PI / 2.0);
	let _ = ctx.arc(right, c.y, half, 3.0 * PI / 2.0, PI / 2.0);
	ctx.close_path();
	ctx.set_fill_style_str(&theme.node.section_fill.to_css());
	ctx.fill();
	ctx.set_stroke_style_str(&theme.edge.color.to_css());
	ctx.set_line_width(1.5 / viewport.zoom);
	ctx.stroke();

	let (arrow, fraction) = match &node.payload {
		NodePayload::PreviousSection { fraction } => ("\u{2190}", fraction),
		NodePayload::NextSection { fraction } => ("\u{2192}", fraction),
		_ => return,
	};
	ctx.set_font(theme.node.label_font);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&theme.node.label_color.to_css());
	let _ = ctx.fill_text(&format!("{arrow} {fraction}"), c.x, c.y);
}
