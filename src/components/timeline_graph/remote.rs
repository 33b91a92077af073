//! Curated position overrides shipped alongside the timeline data.
//!
//! The document at an instance-scoped path is a JSON object mapping node ids
//! to `{x, y}`. Any failure (network, non-2xx, malformed body) yields an empty
//! map. Results arrive asynchronously, so [`RemoteSync`] tracks the fetch as
//! an explicit state machine and rejects results for a superseded request.

use gloo_net::http::Request;
use log::{debug, warn};
use serde_json::Value;

use super::error::LayoutError;
use super::types::{Point, PositionMap};

/// Parse a position document leniently.
///
/// The document must be a JSON object; entries whose value is not an object
/// with finite numeric `x` and `y` are dropped rather than failing the whole map.
pub fn parse_position_map(raw: &str) -> Result<PositionMap, LayoutError> {
	let Value::Object(entries) = serde_json::from_str::<Value>(raw)? else {
		return Err(LayoutError::NotAnObject);
	};
	let total = entries.len();
	let map: PositionMap = entries
		.into_iter()
		.filter_map(|(id, value)| {
			let x = value.get("x")?.as_f64()?;
			let y = value.get("y")?.as_f64()?;
			(x.is_finite() && y.is_finite()).then(|| (id, Point::new(x, y)))
		})
		.collect();
	if map.len() < total {
		debug!(
			"timeline-graph: dropped {} malformed position entries",
			total - map.len()
		);
	}
	Ok(map)
}

/// Fetch and parse the overrides at `url`.
pub async fn try_fetch_overrides(url: &str) -> Result<PositionMap, LayoutError> {
	let response = Request::get(url)
		.send()
		.await
		.map_err(|e| LayoutError::Fetch {
			url: url.to_string(),
			reason: e.to_string(),
		})?;
	if !response.ok() {
		return Err(LayoutError::Status {
			url: url.to_string(),
			status: response.status(),
		});
	}
	let body = response.text().await.map_err(|e| LayoutError::Fetch {
		url: url.to_string(),
		reason: e.to_string(),
	})?;
	parse_position_map(&body)
}

/// Fetch the overrides at `url`, treating every failure as "no overrides".
pub async fn fetch_overrides(url: &str) -> PositionMap {
	match try_fetch_overrides(url).await {
		Ok(map) => {
			debug!("timeline-graph: {} remote positions from {}", map.len(), url);
			map
		}
		Err(e) => {
			warn!("timeline-graph: no remote positions: {}", e);
			PositionMap::new()
		}
	}
}

/// Phase of the fetch-then-merge-then-refit sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemotePhase {
	/// No fetch issued for the current context.
	Idle,
	AwaitingRemote,
	/// Overrides accepted, positions being merged and refit scheduled.
	Applying,
	Settled,
}

/// Identifies one issued fetch. Only the newest ticket is honoured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoteTicket(u64);

/// Remote override state for one graph instance.
#[derive(Clone, Debug)]
pub struct RemoteSync {
	phase: RemotePhase,
	generation: u64,
	overrides: PositionMap,
}

impl Default for RemoteSync {
	fn default() -> Self {
		Self {
			phase: RemotePhase::Idle,
			generation: 0,
			overrides: PositionMap::new(),
		}
	}
}

impl RemoteSync {
	pub fn phase(&self) -> RemotePhase {
		self.phase
	}

	/// Overrides accepted so far; empty until a fetch has been accepted.
	pub fn overrides(&self) -> &PositionMap {
		&self.overrides
	}

	/// Issue a new fetch, superseding any in flight.
	pub fn begin(&mut self) -> RemoteTicket {
		self.generation += 1;
		self.phase = RemotePhase::AwaitingRemote;
		RemoteTicket(self.generation)
	}

	/// Accept a result. Returns false, leaving state untouched, when the
	/// ticket was superseded or cancelled.
	pub fn accept(&mut self, ticket: RemoteTicket, overrides: PositionMap) -> bool {
		if ticket.0 != self.generation || self.phase != RemotePhase::AwaitingRemote {
			debug!("timeline-graph: discarding stale remote positions");
			return false;
		}
		self.overrides = overrides;
		self.phase = RemotePhase::Applying;
		true
	}

	pub fn settle(&mut self) {
		if self.phase == RemotePhase::Applying {
			self.phase = RemotePhase::Settled;
		}
	}

	/// Drop any in-flight fetch; a later result for it is discarded.
	pub fn cancel(&mut self) {
		self.generation += 1;
		if self.phase == RemotePhase::AwaitingRemote {
			self.phase = RemotePhase::Idle;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_valid_entries_and_drops_malformed_ones() {
		let map = parse_position_map(
			r#"{ "m1": {"x": 10, "y": 20.5}, "m2": {"x": "a", "y": 1}, "m3": 4, "m4": {"x": 1} }"#,
		)
		.unwrap();
		assert_eq!(map.len(), 1);
		assert_eq!(map["m1"], Point::new(10.0, 20.5));
	}

	#[test]
	fn non_object_documents_are_errors() {
		assert!(matches!(
			parse_position_map("[1, 2]"),
			Err(LayoutError::NotAnObject)
		));
		assert!(matches!(
			parse_position_map("<html>"),
			Err(LayoutError::Malformed(_))
		));
	}

	#[test]
	fn newest_ticket_wins() {
		let mut sync = RemoteSync::default();
		let first = sync.begin();
		let second = sync.begin();
		let map: PositionMap = [("a".to_string(), Point::new(1.0, 1.0))].into();

		assert!(!sync.accept(first, map.clone()));
		assert_eq!(sync.phase(), RemotePhase::AwaitingRemote);
		assert!(sync.accept(second, map));
		assert_eq!(sync.phase(), RemotePhase::Applying);
		sync.settle();
		assert_eq!(sync.phase(), RemotePhase::Settled);
		assert_eq!(sync.overrides().len(), 1);
	}

	#[test]
	fn cancelled_fetch_is_discarded() {
		let mut sync = RemoteSync::default();
		let ticket = sync.begin();
		sync.cancel();
		assert_eq!(sync.phase(), RemotePhase::Idle);
		assert!(!sync.accept(ticket, PositionMap::new()));
		assert!(sync.overrides().is_empty());
	}
}
