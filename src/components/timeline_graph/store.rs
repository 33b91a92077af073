//! Persisted position overrides.
//!
//! A [`PositionStore`] reads and writes one JSON object (`id -> {x, y}`) under
//! a key derived from the [`GraphInstanceKey`], on top of any
//! [`KeyValueStore`]. Reads fail open to an empty map and write failures are
//! logged and swallowed, so the in-memory session keeps working without
//! durable storage.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use super::error::LayoutError;
use super::remote::parse_position_map;
use super::types::{GraphInstanceKey, PositionMap, Viewport};

/// String key-value storage backend.
pub trait KeyValueStore {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str) -> Result<(), LayoutError>;
	fn remove(&self, key: &str) -> Result<(), LayoutError>;
}

/// In-memory backend. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), LayoutError> {
		self.entries
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), LayoutError> {
		self.entries.borrow_mut().remove(key);
		Ok(())
	}
}

/// Which browser storage area a [`BrowserStore`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageArea {
	/// Survives reloads (manual layouts).
	Local,
	/// Lives for the tab session (last viewport).
	Session,
}

/// `window.localStorage` / `window.sessionStorage` backend.
#[derive(Clone, Copy, Debug)]
pub struct BrowserStore {
	area: StorageArea,
}

impl BrowserStore {
	pub fn new(area: StorageArea) -> Self {
		Self { area }
	}

	fn storage(&self) -> Result<web_sys::Storage, LayoutError> {
		let window = web_sys::window().ok_or(LayoutError::StorageUnavailable)?;
		let storage = match self.area {
			StorageArea::Local => window.local_storage(),
			StorageArea::Session => window.session_storage(),
		};
		storage.ok().flatten().ok_or(LayoutError::StorageUnavailable)
	}
}

impl KeyValueStore for BrowserStore {
	fn get(&self, key: &str) -> Option<String> {
		self.storage().ok()?.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), LayoutError> {
		self.storage()?
			.set_item(key, value)
			.map_err(|e| LayoutError::StorageWrite {
				key: key.to_string(),
				reason: format!("{e:?}"),
			})
	}

	fn remove(&self, key: &str) -> Result<(), LayoutError> {
		self.storage()?
			.remove_item(key)
			.map_err(|e| LayoutError::StorageWrite {
				key: key.to_string(),
				reason: format!("{e:?}"),
			})
	}
}

/// Saved positions for one graph instance.
pub struct PositionStore {
	backend: Rc<dyn KeyValueStore>,
	key: String,
}

impl PositionStore {
	pub fn new(backend: Rc<dyn KeyValueStore>, instance: GraphInstanceKey, prefix: &str) -> Self {
		Self {
			backend,
			key: instance.storage_key(prefix),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	/// Saved overrides; empty when nothing is stored or the value is malformed.
	pub fn load(&self) -> PositionMap {
		let Some(raw) = self.backend.get(&self.key) else {
			return PositionMap::new();
		};
		match parse_position_map(&raw) {
			Ok(map) => map,
			Err(e) => {
				warn!("timeline-graph: ignoring saved positions at {}: {}", self.key, e);
				PositionMap::new()
			}
		}
	}

	/// Replace the saved map. Returns what is now in effect for the session,
	/// which is `positions` even if the write failed.
	pub fn save(&self, positions: &PositionMap) -> PositionMap {
		if let Err(e) = self.try_write(positions) {
			warn!("timeline-graph: could not persist positions: {}", e);
		}
		positions.clone()
	}

	/// Overlay `positions` on the saved map and persist the union.
	pub fn merge_save(&self, positions: &PositionMap) -> PositionMap {
		let mut merged = self.load();
		merged.extend(positions.iter().map(|(id, p)| (id.clone(), *p)));
		self.save(&merged)
	}

	/// Forget every saved override for this instance.
	pub fn clear(&self) {
		if let Err(e) = self.backend.remove(&self.key) {
			warn!("timeline-graph: could not clear {}: {}", self.key, e);
		}
	}

	fn try_write(&self, positions: &PositionMap) -> Result<(), LayoutError> {
		let json = serde_json::to_string(positions)?;
		self.backend.set(&self.key, &json)?;
		debug!(
			"timeline-graph: saved {} positions at {}",
			positions.len(),
			self.key
		);
		Ok(())
	}
}

/// Last viewport of a screen, restored when the user comes back to it.
pub struct ViewportStore {
	backend: Rc<dyn KeyValueStore>,
	key: String,
}

impl ViewportStore {
	pub fn new(backend: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
		Self {
			backend,
			key: key.into(),
		}
	}

	pub fn load(&self) -> Option<Viewport> {
		let raw = self.backend.get(&self.key)?;
		let viewport: Viewport = serde_json::from_str(&raw).ok()?;
		let finite = viewport.pan_x.is_finite()
			&& viewport.pan_y.is_finite()
			&& viewport.zoom.is_finite()
			&& viewport.zoom > 0.0;
		finite.then_some(viewport)
	}

	pub fn save(&self, viewport: &Viewport) {
		let result = serde_json::to_string(viewport)
			.map_err(LayoutError::from)
			.and_then(|json| self.backend.set(&self.key, &json));
		if let Err(e) = result {
			debug!("timeline-graph: could not persist viewport: {}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::timeline_graph::types::Point;

	/// Backend whose writes always fail, like a full quota.
	struct FullStore;

	impl KeyValueStore for FullStore {
		fn get(&self, _key: &str) -> Option<String> {
			None
		}

		fn set(&self, key: &str, _value: &str) -> Result<(), LayoutError> {
			Err(LayoutError::StorageWrite {
				key: key.to_string(),
				reason: "quota".into(),
			})
		}

		fn remove(&self, _key: &str) -> Result<(), LayoutError> {
			Err(LayoutError::StorageUnavailable)
		}
	}

	fn positions(entries: &[(&str, f64, f64)]) -> PositionMap {
		entries
			.iter()
			.map(|(id, x, y)| (id.to_string(), Point::new(*x, *y)))
			.collect()
	}

	#[test]
	fn keys_are_scoped_per_segment() {
		let backend: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
		let a = PositionStore::new(
			backend.clone(),
			GraphInstanceKey::Range {
				from_year: 1991,
				to_year: 2003,
			},
			"timeline-segment-positions",
		);
		let b = PositionStore::new(
			backend,
			GraphInstanceKey::Range {
				from_year: 2003,
				to_year: 2010,
			},
			"timeline-segment-positions",
		);
		assert_eq!(a.key(), "timeline-segment-positions-1991-2003");

		a.save(&positions(&[("c1", 1.0, 2.0)]));
		assert_eq!(a.load().len(), 1);
		assert!(b.load().is_empty());
	}

	#[test]
	fn merge_save_overlays_existing_entries() {
		let backend: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
		let store = PositionStore::new(backend, GraphInstanceKey::Global, "main");
		store.save(&positions(&[("a", 1.0, 1.0), ("b", 2.0, 2.0)]));

		let merged = store.merge_save(&positions(&[("b", 5.0, 5.0), ("c", 3.0, 3.0)]));

		assert_eq!(merged.len(), 3);
		assert_eq!(merged["a"], Point::new(1.0, 1.0));
		assert_eq!(merged["b"], Point::new(5.0, 5.0));
		assert_eq!(store.load(), merged);
	}

	#[test]
	fn malformed_saved_value_loads_as_empty() {
		let memory = MemoryStore::new();
		memory.set("main", "{not json").unwrap();
		let store = PositionStore::new(Rc::new(memory), GraphInstanceKey::Global, "main");
		assert!(store.load().is_empty());
	}

	#[test]
	fn failed_write_still_returns_session_state() {
		let store = PositionStore::new(Rc::new(FullStore), GraphInstanceKey::Global, "main");
		let saved = store.save(&positions(&[("a", 1.0, 1.0)]));
		assert_eq!(saved.len(), 1);
		store.clear();
	}

	#[test]
	fn viewport_round_trips_and_rejects_bad_zoom() {
		let memory = MemoryStore::new();
		let store = ViewportStore::new(Rc::new(memory.clone()), "vp");
		assert_eq!(store.load(), None);

		let viewport = Viewport {
			pan_x: 12.0,
			pan_y: -4.0,
			zoom: 0.5,
		};
		store.save(&viewport);
		assert_eq!(store.load(), Some(viewport));

		memory.set("vp", r#"{"x":0,"y":0,"zoom":0}"#).unwrap();
		assert_eq!(store.load(), None);
	}
}
