//! Headless filter workflow: stream stdin into the store, then scan once.

use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use sift_core::{
	ChunkList, EventBox, EventKind, FieldRange, Item, ItemBuilder, Matcher, Reader, SearchOptions,
};

pub(crate) struct FilterOutcome {
	pub(crate) matched: usize,
}

/// Drain stdin on a reader thread, wait for the end-of-stream signal on the
/// event bus, then run one scan and print the ranked matches.
pub(crate) fn run_filter(
	query: &str,
	options: SearchOptions,
	ranges: Vec<FieldRange>,
) -> Result<FilterOutcome> {
	let event_box = Arc::new(EventBox::new());
	let store = Arc::new(ChunkList::new(item_builder(ranges)));

	let reader = Reader::new(Arc::clone(&store), Arc::clone(&event_box));
	let reader_thread = thread::spawn(move || reader.read_from(io::stdin().lock()));

	// The renderer's half of the bus contract: block until the reader
	// signals the end of the stream.
	let mut reading = true;
	while reading {
		event_box.wait(|events| {
			if events.contains_key(&EventKind::ReadFin) {
				reading = false;
			}
		});
	}
	match reader_thread.join() {
		Ok(result) => result.context("reading candidates from stdin")?,
		Err(_) => return Err(anyhow!("candidate reader thread panicked")),
	}

	let (chunks, _) = store.snapshot();
	let matcher = Matcher::new(options, event_box);
	let query: Vec<char> = query.chars().collect();
	let Some(merger) = matcher.find(chunks, &query) else {
		return Ok(FilterOutcome { matched: 0 });
	};

	let stdout = io::stdout().lock();
	let mut out = BufWriter::new(stdout);
	for index in 0..merger.len() {
		writeln!(out, "{}", merger.get(index).item.output())?;
	}
	out.flush()?;

	Ok(FilterOutcome {
		matched: merger.len(),
	})
}

fn item_builder(ranges: Vec<FieldRange>) -> ItemBuilder {
	if ranges.is_empty() {
		Box::new(|index, line| Item::new(index, &line))
	} else {
		Box::new(move |index, line| Item::with_fields(index, line, &ranges))
	}
}
