//! Streaming candidate ingestion.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Result;

use crate::event::{Event, EventBox, EventKind};
use crate::store::ChunkList;

/// Drains candidate lines from a buffered source into a chunk store,
/// signalling the renderer bus as data arrives.
///
/// `ReadNew` is set once per ingested line; the bus coalesces, so a fast
/// producer collapses into a single pending notification. `ReadFin` is
/// always signalled when the source is exhausted, even on a read error.
pub struct Reader {
	store: Arc<ChunkList>,
	event_box: Arc<EventBox<Event>>,
}

impl Reader {
	/// Create a reader that fills `store` and signals `event_box`.
	#[must_use]
	pub fn new(store: Arc<ChunkList>, event_box: Arc<EventBox<Event>>) -> Self {
		Self { store, event_box }
	}

	/// Push every line of `source` into the store.
	///
	/// # Errors
	///
	/// Returns the underlying I/O error when the source fails mid-stream;
	/// `ReadFin` has been signalled either way.
	pub fn read_from(&self, source: impl BufRead) -> Result<()> {
		let result = self.drain(source);
		self.event_box.set(EventKind::ReadFin, Event::ReadFin);
		result
	}

	fn drain(&self, source: impl BufRead) -> Result<()> {
		for line in source.lines() {
			self.store.push(line?);
			self.event_box.set(EventKind::ReadNew, Event::ReadNew);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::item::Item;
	use std::io::Cursor;

	fn fixture() -> (Arc<ChunkList>, Arc<EventBox<Event>>, Reader) {
		let store = Arc::new(ChunkList::new(Box::new(|index, line| {
			Item::new(index, &line)
		})));
		let bus = Arc::new(EventBox::new());
		let reader = Reader::new(Arc::clone(&store), Arc::clone(&bus));
		(store, bus, reader)
	}

	#[test]
	fn ingests_lines_in_order_and_signals_completion() {
		let (store, bus, reader) = fixture();
		reader.read_from(Cursor::new("alpha\nbeta\ngamma\n")).unwrap();

		assert_eq!(store.count(), 3);
		let (chunks, _) = store.snapshot();
		let items = chunks[0].items();
		assert_eq!(items[0].output(), "alpha");
		assert_eq!(items[2].index(), 2);

		assert!(bus.peek(EventKind::ReadNew));
		assert!(bus.peek(EventKind::ReadFin));
	}

	#[test]
	fn empty_sources_still_signal_completion() {
		let (store, bus, reader) = fixture();
		reader.read_from(Cursor::new("")).unwrap();
		assert_eq!(store.count(), 0);
		assert!(!bus.peek(EventKind::ReadNew));
		assert!(bus.peek(EventKind::ReadFin));
	}

	#[test]
	fn keeps_blank_lines_as_candidates() {
		let (store, _, reader) = fixture();
		reader.read_from(Cursor::new("a\n\nb\n")).unwrap();
		assert_eq!(store.count(), 3);
	}
}
