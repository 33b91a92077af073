//! timeline-graph: Interactive node-graph timeline for milestones and credentials.
//!
//! This crate provides a WASM-based timeline component that lays milestones
//! out on a canvas, opens the credentials between two milestones as a
//! paginated segment, and keeps every screen fitted to its container.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::timeline_graph::{
	Credential, EdgePayload, GraphEvent, NodePayload, ScreenContext, TimelineCanvas,
	TimelineConfig, TimelineData, Variant,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("timeline-graph: logging initialized");
}

/// Parse the JSON body of the script element with the given id.
fn read_script_json<T: DeserializeOwned>(id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<T>(&json_text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("timeline-graph: failed to parse #{}: {}", id, e);
			None
		}
	}
}

/// Load timeline data from a script element with id="timeline-data".
/// Expected format: JSON with { milestones: [...], credentials: [...] }
fn load_timeline_data() -> Option<TimelineData> {
	let data: TimelineData = read_script_json("timeline-data")?;
	info!(
		"timeline-graph: loaded {} milestones, {} credentials",
		data.milestones.len(),
		data.credentials.len()
	);
	Some(data)
}

/// Optional overrides from a script element with id="timeline-config".
fn load_config() -> Option<TimelineConfig> {
	read_script_json("timeline-config")
}

/// Layout editing is offered when the page URL carries `edit=1`.
fn show_edit_controls() -> bool {
	web_sys::window()
		.and_then(|w| w.location().search().ok())
		.is_some_and(|search| {
			search
				.trim_start_matches('?')
				.split('&')
				.any(|pair| pair == "edit=1")
		})
}

/// Main application component.
/// Loads timeline data from the DOM and switches between the milestone
/// overview and the segment screens.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let data = load_timeline_data().unwrap_or_default();
	let config = load_config().unwrap_or_default();
	let edit_controls = show_edit_controls();

	let (context, set_context) = signal(ScreenContext::Milestones);
	let (variant, set_variant) = signal(Variant::Plain);
	let (selected, set_selected) = signal(None::<Credential>);

	let credentials = data.credentials.clone();
	let on_event = Callback::new(move |event: GraphEvent| match event {
		GraphEvent::EdgeClicked {
			payload: EdgePayload::Segment(segment),
			..
		} if !segment.credential_ids.is_empty() => {
			info!(
				"timeline-graph: opening segment {}-{}",
				segment.from_year, segment.to_year
			);
			set_selected.set(None);
			set_context.set(ScreenContext::Segment {
				segment,
				initial_page: 0,
			});
		}
		GraphEvent::NodeClicked {
			payload: NodePayload::Credential { credential, .. },
			..
		} => set_selected.set(Some(credential)),
		GraphEvent::NodeClicked {
			payload: NodePayload::Milestone(milestone),
			..
		} => {
			let credential = milestone
				.credential_id
				.as_deref()
				.and_then(|id| credentials.iter().find(|c| c.id == id))
				.cloned();
			set_selected.set(credential);
		}
		_ => {}
	});

	let on_back = move |_| {
		set_selected.set(None);
		set_context.set(ScreenContext::Milestones);
	};
	let on_variant = move |_| {
		set_variant.update(|v| {
			*v = match v {
				Variant::Plain => Variant::Decorated,
				Variant::Decorated => Variant::Plain,
			}
		})
	};

	let in_segment = move || matches!(context.get(), ScreenContext::Segment { .. });
	let heading = move || match context.get() {
		ScreenContext::Milestones => "Timeline".to_string(),
		ScreenContext::Segment { segment, .. } => {
			format!("{} \u{2013} {}", segment.from_year, segment.to_year)
		}
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Timeline" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<TimelineCanvas
				data=data
				config=config
				context=context
				variant=variant
				edit_controls=edit_controls
				on_event=on_event
			/>
			<div class="graph-overlay">
				<h1>{heading}</h1>
				<Show when=in_segment>
					<button on:click=on_back>"Back to timeline"</button>
				</Show>
				<button on:click=on_variant>"Switch style"</button>
				<p class="subtitle">"Arrow keys, space or enter to step through. Click a link to open a segment."</p>
			</div>
			{move || {
				selected
					.get()
					.map(|c| {
						view! {
							<div class="credential-detail">
								<h2>{c.title.clone()}</h2>
								<p>{c.institution.clone()}</p>
								<p>{c.date.clone().unwrap_or_else(|| c.year.to_string())}</p>
								<button on:click=move |_| set_selected.set(None)>"Close"</button>
							</div>
						}
					})
			}}
		</div>
	}
}
