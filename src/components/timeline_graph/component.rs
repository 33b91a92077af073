//! Leptos component wrapping the timeline canvas.
//!
//! The component creates an HTML canvas element and wires up mouse, wheel and
//! keyboard handlers for navigation, dragging, panning and zooming. An
//! animation loop runs via `requestAnimationFrame`, ticking the current
//! [`GraphInstance`] (scheduled fits, viewport tweens) and rendering it each
//! frame. Changing the `context` signal tears the instance down and builds a
//! fresh one, so nothing from the previous screen survives the switch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::config::TimelineConfig;
use super::instance::{GraphEvent, GraphInstance, ScreenContext, Stores};
use super::remote::fetch_overrides;
use super::render;
use super::theme::Theme;
use super::types::{Point, Size, TimelineData, Variant};

/// Bundles the live graph instance with its visual theme.
struct CanvasContext {
	instance: GraphInstance,
	theme: Theme,
}

type SharedContext = Rc<RefCell<Option<CanvasContext>>>;

fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or(0.0)
}

/// Current size of the canvas' parent container.
fn measure_surface(canvas: &HtmlCanvasElement) -> Size {
	let (w, h) = canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((800.0, 600.0));
	Size::new(w, h)
}

/// Size the canvas to its parent container and return that size.
fn fit_canvas(canvas: &HtmlCanvasElement) -> Size {
	let surface = measure_surface(canvas);
	canvas.set_width(surface.width as u32);
	canvas.set_height(surface.height as u32);
	surface
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Fetch curated positions for the current instance. A result arriving after
/// the screen changed (`epoch` moved on) is dropped.
fn start_remote_fetch(shared: &SharedContext, epoch: &Rc<Cell<u64>>) {
	let started = shared
		.borrow_mut()
		.as_mut()
		.map(|c| (c.instance.begin_remote_fetch(), c.instance.remote_url()));
	let Some((ticket, url)) = started else {
		return;
	};
	let expected = epoch.get();
	let (shared, epoch) = (shared.clone(), epoch.clone());
	spawn_local(async move {
		let overrides = fetch_overrides(&url).await;
		if epoch.get() != expected {
			debug!("timeline-graph: screen changed, dropping positions from {}", url);
			return;
		}
		if let Some(c) = shared.borrow_mut().as_mut() {
			c.instance.apply_remote(ticket, overrides, now_ms());
		}
	});
}

/// Renders one timeline screen on a canvas element.
///
/// `context` selects the milestone overview or a segment; `variant` switches
/// the node decoration. Clicks on nodes and edges are reported through
/// `on_event`. With `edit_controls`, buttons to lock, unlock and reset the
/// manual layout and to toggle panning are shown.
#[component]
pub fn TimelineCanvas(
	data: TimelineData,
	#[prop(optional)] config: TimelineConfig,
	#[prop(into)] context: Signal<ScreenContext>,
	#[prop(into)] variant: Signal<Variant>,
	#[prop(default = false)] edit_controls: bool,
	#[prop(into)] on_event: Callback<GraphEvent>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let shared: SharedContext = Rc::new(RefCell::new(None));
	let epoch = Rc::new(Cell::new(0u64));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let keydown_cb: Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>> =
		Rc::new(RefCell::new(None));
	let progress = RwSignal::new((0usize, 0usize));
	let locked = RwSignal::new(true);
	let pan_enabled = RwSignal::new(false);
	let stores = Stores::browser();

	// One instance per screen context.
	let (shared_ctx, epoch_ctx) = (shared.clone(), epoch.clone());
	Effect::new(move |_| {
		let screen = context.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let surface = fit_canvas(&canvas);
		let variant = variant.get_untracked();

		if let Some(old) = shared_ctx.borrow_mut().as_mut() {
			old.instance.teardown();
		}
		epoch_ctx.set(epoch_ctx.get() + 1);

		let mut instance = GraphInstance::for_context(&screen, &data, config.clone(), &stores, variant);
		instance.mount(surface, now_ms());
		let layout_locked = instance.is_layout_locked();
		*shared_ctx.borrow_mut() = Some(CanvasContext {
			instance,
			theme: Theme::for_variant(variant),
		});
		locked.set(layout_locked);
		pan_enabled.set(false);
		start_remote_fetch(&shared_ctx, &epoch_ctx);
	});

	let shared_variant = shared.clone();
	Effect::new(move |_| {
		let variant = variant.get();
		if let Some(c) = shared_variant.borrow_mut().as_mut() {
			c.instance.set_variant(variant, now_ms());
			c.theme = Theme::for_variant(variant);
		}
	});

	// Animation loop and keyboard listener, installed once the canvas exists.
	let (shared_init, animate_init, keydown_cb_init) =
		(shared.clone(), animate.clone(), keydown_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::warn!("timeline-graph: canvas has no 2d context");
			return;
		};

		let shared_keys = shared_init.clone();
		*keydown_cb_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			let forward = match ev.key().as_str() {
				"ArrowRight" | "ArrowDown" | " " | "Enter" => true,
				"ArrowLeft" | "ArrowUp" => false,
				_ => return,
			};
			ev.prevent_default();
			if let Some(c) = shared_keys.borrow_mut().as_mut() {
				if forward {
					c.instance.next(now_ms());
				} else {
					c.instance.prev(now_ms());
				}
			}
		}));
		if let Some(ref cb) = *keydown_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		// The container is measured every frame: it may settle after mount or
		// change without a window resize.
		let (shared_anim, animate_inner) = (shared_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let measured = measure_surface(&canvas);
			let frame_progress = shared_anim.borrow_mut().as_mut().map(|c| {
				let now = now_ms();
				if c.instance.surface() != measured {
					fit_canvas(&canvas);
					c.instance.resize(measured, now);
				}
				c.instance.tick(now);
				render::render(&c.instance, &ctx, &c.theme);
				c.instance.progress()
			});
			if let Some(p) = frame_progress {
				if progress.get_untracked() != p {
					progress.set(p);
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(w) = web_sys::window() {
					let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let shared_md = shared.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(c) = shared_md.borrow_mut().as_mut() {
			c.instance.pointer_down(p);
		}
	};

	let shared_mm = shared.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(c) = shared_mm.borrow_mut().as_mut() {
			c.instance.pointer_move(p);
		}
	};

	let shared_mu = shared.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(p) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let event = shared_mu
			.borrow_mut()
			.as_mut()
			.and_then(|c| c.instance.pointer_up(p, now_ms()));
		if let Some(event) = event {
			on_event.run(event);
		}
	};

	let shared_ml = shared.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(c) = shared_ml.borrow_mut().as_mut() {
			c.instance.pointer_leave();
		}
	};

	let shared_wh = shared.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(c) = shared_wh.borrow_mut().as_mut() {
			c.instance.wheel(p, ev.delta_y());
		}
	};

	let (shared_prev, shared_next) = (shared.clone(), shared.clone());
	let on_prev = move |_| {
		if let Some(c) = shared_prev.borrow_mut().as_mut() {
			c.instance.prev(now_ms());
		}
	};
	let on_next = move |_| {
		if let Some(c) = shared_next.borrow_mut().as_mut() {
			c.instance.next(now_ms());
		}
	};

	let controls = edit_controls.then(|| {
		let (shared_lock, shared_reset, shared_pan) = (shared.clone(), shared.clone(), shared.clone());
		let on_lock = move |_| {
			if let Some(c) = shared_lock.borrow_mut().as_mut() {
				if c.instance.is_layout_locked() {
					c.instance.unlock_layout();
				} else {
					c.instance.lock_layout();
				}
				locked.set(c.instance.is_layout_locked());
			}
		};
		let on_reset = move |_| {
			if let Some(c) = shared_reset.borrow_mut().as_mut() {
				c.instance.reset_layout(now_ms());
			}
		};
		let on_pan = move |_| {
			if let Some(c) = shared_pan.borrow_mut().as_mut() {
				let enabled = !c.instance.is_pan_enabled();
				c.instance.set_pan_enabled(enabled);
				pan_enabled.set(enabled);
			}
		};
		view! {
			<div class="timeline-edit-controls">
				<button on:click=on_lock>
					{move || if locked.get() { "Unlock layout" } else { "Lock layout" }}
				</button>
				<button on:click=on_reset>"Reset layout"</button>
				<button on:click=on_pan>
					{move || if pan_enabled.get() { "Disable pan" } else { "Enable pan" }}
				</button>
			</div>
		}
	});

	view! {
		<div class="timeline-graph">
			<canvas
				node_ref=canvas_ref
				class="timeline-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: pointer;"
			/>
			<div class="timeline-nav">
				<button on:click=on_prev>"Previous"</button>
				<span class="timeline-progress">
					{move || {
						let (position, total) = progress.get();
						format!("{position} / {total}")
					}}
				</span>
				<button on:click=on_next>"Next"</button>
			</div>
			{controls}
		</div>
	}
}
