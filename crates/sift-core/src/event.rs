//! Coalescing typed event mailbox.
//!
//! Unlike a channel, an [`EventBox`] latches the *latest* payload per event
//! kind: setting a kind that is already pending overwrites it. That
//! coalescing is load-bearing for the search pipeline — a burst of
//! keystrokes or read batches collapses into one pending request instead of
//! queueing obsolete work.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::merger::Merger;

/// Identifies one latched slot in an [`EventBox`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
	/// The reader ingested more candidates.
	ReadNew,
	/// The reader reached the end of its source.
	ReadFin,
	/// A scan has been running long enough to report progress.
	SearchProgress,
	/// A scan completed and published its merger.
	SearchFin,
	/// The host is shutting the pipeline down.
	Close,
	/// Matcher-internal: re-run the current pattern without cancelling.
	ReqRetry,
	/// Matcher-internal: new pattern or candidates; abort in-flight work.
	ReqReset,
}

/// Payloads published on the renderer-facing bus.
#[derive(Clone, Debug)]
pub enum Event {
	ReadNew,
	ReadFin,
	/// Fraction of chunks scanned so far, in `[0, 1]`.
	SearchProgress(f32),
	/// The completed result view for the latest honored request.
	SearchFin(Arc<Merger>),
	Close,
}

/// Pending payloads keyed by kind.
pub type Events<T> = HashMap<EventKind, T>;

/// Mutex-and-condvar mailbox shared between pipeline stages.
pub struct EventBox<T> {
	events: Mutex<Events<T>>,
	cond: Condvar,
}

impl<T> EventBox<T> {
	/// Create an empty mailbox.
	#[must_use]
	pub fn new() -> Self {
		Self {
			events: Mutex::new(HashMap::new()),
			cond: Condvar::new(),
		}
	}

	/// Latch `payload` under `kind`, overwriting any pending payload of the
	/// same kind, and wake one waiter.
	pub fn set(&self, kind: EventKind, payload: T) {
		let mut events = self.events.lock().unwrap();
		events.insert(kind, payload);
		self.cond.notify_one();
	}

	/// Block until at least one event is pending, hand the full mapping to
	/// `handler`, then clear it. The drain is atomic: no payload set before
	/// the handler ran survives it.
	pub fn wait<F: FnOnce(&mut Events<T>)>(&self, handler: F) {
		let mut events = self.events.lock().unwrap();
		while events.is_empty() {
			events = self.cond.wait(events).unwrap();
		}
		handler(&mut events);
		events.clear();
	}

	/// Like [`wait`](Self::wait) but gives up after `timeout`. Returns
	/// whether the handler ran.
	pub fn wait_timeout<F: FnOnce(&mut Events<T>)>(&self, timeout: Duration, handler: F) -> bool {
		let deadline = Instant::now() + timeout;
		let mut events = self.events.lock().unwrap();
		while events.is_empty() {
			let now = Instant::now();
			if now >= deadline {
				return false;
			}
			let (guard, _) = self.cond.wait_timeout(events, deadline - now).unwrap();
			events = guard;
		}
		handler(&mut events);
		events.clear();
		true
	}

	/// Report whether an event of `kind` is pending without consuming it.
	#[must_use]
	pub fn peek(&self, kind: EventKind) -> bool {
		self.events.lock().unwrap().contains_key(&kind)
	}
}

impl<T> Default for EventBox<T> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread;

	#[test]
	fn set_overwrites_pending_payloads_of_the_same_kind() {
		let bus = EventBox::new();
		bus.set(EventKind::SearchProgress, Event::SearchProgress(0.25));
		bus.set(EventKind::SearchProgress, Event::SearchProgress(0.75));
		let mut seen = Vec::new();
		bus.wait(|events| {
			assert_eq!(events.len(), 1);
			if let Some(Event::SearchProgress(fraction)) = events.remove(&EventKind::SearchProgress)
			{
				seen.push(fraction);
			}
		});
		assert_eq!(seen, [0.75]);
	}

	#[test]
	fn wait_drains_every_pending_kind_at_once() {
		let bus = EventBox::new();
		bus.set(EventKind::ReadNew, Event::ReadNew);
		bus.set(EventKind::Close, Event::Close);
		let mut kinds = Vec::new();
		bus.wait(|events| {
			kinds.extend(events.keys().copied());
		});
		kinds.sort_by_key(|kind| format!("{kind:?}"));
		assert_eq!(kinds, [EventKind::Close, EventKind::ReadNew]);
		// Drained: a timed wait must now report nothing.
		assert!(!bus.wait_timeout(Duration::from_millis(10), |_| {}));
	}

	#[test]
	fn peek_does_not_consume() {
		let bus = EventBox::new();
		bus.set(EventKind::ReadFin, Event::ReadFin);
		assert!(bus.peek(EventKind::ReadFin));
		assert!(bus.peek(EventKind::ReadFin));
		assert!(!bus.peek(EventKind::ReadNew));
	}

	#[test]
	fn wait_wakes_on_a_set_from_another_thread() {
		let bus = Arc::new(EventBox::new());
		let setter = Arc::clone(&bus);
		let handle = thread::spawn(move || {
			setter.set(EventKind::ReadFin, Event::ReadFin);
		});
		let mut woke = false;
		bus.wait(|events| {
			woke = events.contains_key(&EventKind::ReadFin);
		});
		handle.join().unwrap();
		assert!(woke);
	}
}
