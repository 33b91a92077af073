//! Coalesces and retries fit requests.
//!
//! The rendering surface settles asynchronously (container measured after
//! layout, fonts and images still loading), so fits are never run inline.
//! The scheduler is a clock-driven state machine: callers pass the current
//! time to every method and poll [`FitScheduler::on_frame`] once per rendered
//! frame, which yields at most one fit.
//!
//! - Debounced requests share a single trailing timer; a newer request always
//!   replaces the pending one, so a superseded timer can never fire.
//! - A retrying request waits a few frames, then fires at fixed offsets to
//!   catch both early- and late-settling layouts, and gives up once its
//!   window closes.

use super::config::SchedulerConfig;

/// Why a fit runs; decides how the resulting viewport change is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitTrigger {
	/// Mount, resize, theme switch, remote positions: apply instantly.
	Layout,
	/// Next/previous step: animate.
	Navigate,
	/// Direct selection: apply instantly.
	Select,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
	due_ms: f64,
	trigger: FitTrigger,
}

#[derive(Clone, Debug)]
struct Retry {
	frames_left: u32,
	attempts_ms: Vec<f64>,
	expires_ms: f64,
}

#[derive(Clone, Debug)]
pub struct FitScheduler {
	config: SchedulerConfig,
	pending: Option<Pending>,
	retry: Option<Retry>,
}

impl FitScheduler {
	pub fn new(config: SchedulerConfig) -> Self {
		Self {
			config,
			pending: None,
			retry: None,
		}
	}

	/// Nothing pending or retrying.
	pub fn is_idle(&self) -> bool {
		self.pending.is_none() && self.retry.is_none()
	}

	/// Debounced fit after the configured window.
	pub fn request_fit(&mut self, now_ms: f64) {
		self.schedule(now_ms, self.config.debounce_ms, FitTrigger::Layout);
	}

	/// Short-delay fit for navigation; `animated` picks the trigger and delay.
	pub fn request_navigation_fit(&mut self, now_ms: f64, animated: bool) {
		if animated {
			self.schedule(
				now_ms,
				self.config.navigation_animated_delay_ms,
				FitTrigger::Navigate,
			);
		} else {
			self.schedule(
				now_ms,
				self.config.navigation_instant_delay_ms,
				FitTrigger::Select,
			);
		}
	}

	/// Bounded retry after bulk position replacement. Replaces any retry in progress.
	pub fn request_fit_retrying(&mut self, now_ms: f64) {
		self.retry = Some(Retry {
			frames_left: self.config.retry_frames,
			attempts_ms: Vec::new(),
			expires_ms: now_ms + self.config.retry_window_ms,
		});
		if self.config.retry_frames == 0 {
			self.arm_retry(now_ms);
		}
	}

	/// Drop every pending and retrying fit (context teardown).
	pub fn cancel_all(&mut self) {
		self.pending = None;
		self.retry = None;
	}

	/// Advance to `now_ms` at a frame boundary. Returns the fit to run, if any.
	pub fn on_frame(&mut self, now_ms: f64) -> Option<FitTrigger> {
		let mut due = None;

		if let Some(pending) = self.pending {
			if now_ms >= pending.due_ms {
				self.pending = None;
				due = Some(pending.trigger);
			}
		}

		let mut arm = false;
		if let Some(retry) = self.retry.as_mut() {
			if retry.frames_left > 0 {
				retry.frames_left -= 1;
				arm = retry.frames_left == 0;
			} else {
				let before = retry.attempts_ms.len();
				retry.attempts_ms.retain(|t| *t > now_ms);
				if retry.attempts_ms.len() < before && due.is_none() {
					due = Some(FitTrigger::Layout);
				}
			}
		}
		if arm {
			self.arm_retry(now_ms);
		}

		if let Some(retry) = &self.retry {
			let exhausted = retry.frames_left == 0 && retry.attempts_ms.is_empty();
			if now_ms >= retry.expires_ms || exhausted {
				self.retry = None;
			}
		}

		due
	}

	fn schedule(&mut self, now_ms: f64, delay_ms: f64, trigger: FitTrigger) {
		self.pending = Some(Pending {
			due_ms: now_ms + delay_ms,
			trigger,
		});
	}

	fn arm_retry(&mut self, now_ms: f64) {
		let offsets = &self.config.retry_offsets_ms;
		if let Some(retry) = self.retry.as_mut() {
			retry.attempts_ms = offsets
				.iter()
				.map(|o| now_ms + o)
				.filter(|t| *t <= retry.expires_ms)
				.collect();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const FRAME_MS: f64 = 16.0;

	/// Poll every frame from `from` to `to`, collecting (time, trigger) of each fit.
	fn run_frames(s: &mut FitScheduler, from: f64, to: f64) -> Vec<(f64, FitTrigger)> {
		let mut fired = Vec::new();
		let mut t = from;
		while t <= to {
			if let Some(trigger) = s.on_frame(t) {
				fired.push((t, trigger));
			}
			t += FRAME_MS;
		}
		fired
	}

	#[test]
	fn two_requests_within_window_fire_once() {
		let mut s = FitScheduler::new(SchedulerConfig::default());
		s.request_fit(0.0);
		assert!(run_frames(&mut s, 0.0, 48.0).is_empty());
		s.request_fit(50.0);

		let fired = run_frames(&mut s, 64.0, 2000.0);
		assert_eq!(fired.len(), 1);
		assert!(fired[0].0 >= 330.0);
		assert_eq!(fired[0].1, FitTrigger::Layout);
		assert!(s.is_idle());
	}

	#[test]
	fn requests_spaced_beyond_window_fire_separately() {
		let mut s = FitScheduler::new(SchedulerConfig::default());
		s.request_fit(0.0);
		let first = run_frames(&mut s, 0.0, 400.0);
		s.request_fit(400.0);
		let second = run_frames(&mut s, 416.0, 1000.0);
		assert_eq!(first.len(), 1);
		assert_eq!(second.len(), 1);
	}

	#[test]
	fn newest_request_decides_trigger() {
		let mut s = FitScheduler::new(SchedulerConfig::default());
		s.request_fit(0.0);
		s.request_navigation_fit(10.0, true);
		let fired = run_frames(&mut s, 16.0, 1000.0);
		assert_eq!(fired.len(), 1);
		assert_eq!(fired[0].1, FitTrigger::Navigate);
		assert!(fired[0].0 >= 60.0 && fired[0].0 < 280.0);
	}

	#[test]
	fn retrying_fit_waits_frames_then_fires_twice() {
		let mut s = FitScheduler::new(SchedulerConfig::default());
		s.request_fit_retrying(0.0);

		// Frames at 0 and 16 consume the wait; attempts at 66 and 236.
		let fired = run_frames(&mut s, 0.0, 2000.0);
		let times: Vec<f64> = fired.iter().map(|(t, _)| *t).collect();
		assert_eq!(times, vec![80.0, 240.0]);
		assert!(s.is_idle());
	}

	#[test]
	fn retry_window_bounds_attempts() {
		let config = SchedulerConfig {
			retry_window_ms: 120.0,
			..SchedulerConfig::default()
		};
		let mut s = FitScheduler::new(config);
		s.request_fit_retrying(0.0);
		let fired = run_frames(&mut s, 0.0, 2000.0);
		assert_eq!(fired.len(), 1);
		assert!(s.is_idle());
	}

	#[test]
	fn coinciding_retry_and_debounce_fit_once() {
		let config = SchedulerConfig {
			retry_offsets_ms: vec![84.0],
			..SchedulerConfig::default()
		};
		let mut s = FitScheduler::new(config);
		s.request_fit_retrying(0.0);
		s.request_navigation_fit(0.0, false);
		// Both the attempt (16 + 84) and the debounce (0 + 100) come due at 100.
		let fired = run_frames(&mut s, 0.0, 2000.0);
		assert_eq!(fired, vec![(112.0, FitTrigger::Select)]);
		assert!(s.is_idle());
	}

	#[test]
	fn cancel_all_drops_everything() {
		let mut s = FitScheduler::new(SchedulerConfig::default());
		s.request_fit(0.0);
		s.request_fit_retrying(0.0);
		s.cancel_all();
		assert!(s.is_idle());
		assert!(run_frames(&mut s, 0.0, 2000.0).is_empty());
	}
}
