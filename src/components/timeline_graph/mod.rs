//! Interactive node-graph timeline component.
//!
//! Renders a timeline of milestones on an HTML canvas, with each stretch
//! between two milestones opening a paginated segment of credentials:
//! - Deterministic default layouts (single row, two-row snake)
//! - Position precedence: saved manual layout, then curated remote
//!   positions, then the generated default
//! - Auto-fit on mount, resize and navigation, either by pan + zoom or by
//!   rescaling node positions at a pinned zoom
//! - Keyboard and click navigation across nodes and pages
//! - Optional layout editing (drag, lock, reset)
//!
//! # Example
//!
//! ```ignore
//! use timeline_graph::{ScreenContext, TimelineCanvas, TimelineData, Variant};
//!
//! let (context, set_context) = signal(ScreenContext::Milestones);
//! view! {
//!     <TimelineCanvas
//!         data=data
//!         context=context
//!         variant=Signal::stored(Variant::Plain)
//!         on_event=Callback::new(move |event| handle(event, set_context))
//!     />
//! }
//! ```

mod component;
pub mod config;
pub mod error;
pub mod fit;
pub mod graph;
pub mod instance;
pub mod layout;
pub mod navigation;
pub mod pagination;
pub mod remote;
mod render;
pub mod resolver;
pub mod scheduler;
pub mod segments;
pub mod store;
pub mod theme;
pub mod types;

pub use component::TimelineCanvas;
pub use config::TimelineConfig;
pub use error::LayoutError;
pub use instance::{EdgePayload, GraphEvent, GraphInstance, NodePayload, ScreenContext, Stores};
pub use theme::Theme;
pub use types::{Credential, Milestone, Point, Segment, Size, TimelineData, Variant, Viewport};
