//! Parallel pattern evaluation with cancellation, caching, and progress.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::event::{Event, EventBox, EventKind};
use crate::merger::{MatchedItem, Merger, by_relevance};
use crate::options::SearchOptions;
use crate::pattern::Pattern;
use crate::store::{Chunk, count_items};

/// How long a scan may run before progress is published.
const PROGRESS_MIN_DURATION: Duration = Duration::from_millis(200);

/// Matching work for one pattern over one candidate snapshot.
pub struct MatchRequest {
	pub chunks: Vec<Arc<Chunk>>,
	pub pattern: Arc<Pattern>,
}

/// Renderer-facing handle for (re)starting searches on a running
/// [`Matcher`]. Requests coalesce on the matcher's private box: only the
/// latest pending reset survives a burst.
#[derive(Clone)]
pub struct MatchRequester {
	options: SearchOptions,
	req_box: Arc<EventBox<MatchRequest>>,
}

impl MatchRequester {
	/// Install a new pattern and candidate snapshot. With `cancel` the
	/// in-flight scan aborts at its next chunk boundary; otherwise it is
	/// allowed to finish before the new request is picked up.
	pub fn reset(&self, chunks: Vec<Arc<Chunk>>, query: &[char], cancel: bool) {
		let pattern = Pattern::build(query, &self.options);
		let kind = if cancel {
			EventKind::ReqReset
		} else {
			EventKind::ReqRetry
		};
		self.req_box.set(kind, MatchRequest { chunks, pattern });
	}
}

/// Dispatches pattern evaluation across chunk snapshots in parallel.
///
/// One long-lived [`run`](Self::run) loop serves coalesced requests;
/// completed scans are cached per pattern string until the candidate count
/// changes, and published on the output bus as `SearchFin`.
pub struct Matcher {
	options: SearchOptions,
	event_box: Arc<EventBox<Event>>,
	req_box: Arc<EventBox<MatchRequest>>,
	partitions: usize,
	merger_cache: HashMap<String, Arc<Merger>>,
}

impl Matcher {
	/// Create a matcher publishing results to `event_box`.
	#[must_use]
	pub fn new(options: SearchOptions, event_box: Arc<EventBox<Event>>) -> Self {
		let partitions = thread::available_parallelism().map_or(1, NonZeroUsize::get);
		Self {
			options,
			event_box,
			req_box: Arc::new(EventBox::new()),
			partitions,
			merger_cache: HashMap::new(),
		}
	}

	/// A handle for issuing resets from other threads.
	#[must_use]
	pub fn requester(&self) -> MatchRequester {
		MatchRequester {
			options: self.options.clone(),
			req_box: Arc::clone(&self.req_box),
		}
	}

	/// Serve reset requests until the process exits. Runs on its own
	/// thread; a cancelled scan publishes nothing and yields to the next
	/// pending request.
	pub fn run(mut self) {
		let mut prev_count = 0;
		loop {
			let mut request = None;
			self.req_box.wait(|events| {
				// A pending reset supersedes a pending retry.
				request = events
					.remove(&EventKind::ReqReset)
					.or_else(|| events.remove(&EventKind::ReqRetry));
			});
			let Some(request) = request else { continue };

			let pattern_string = request.pattern.as_string().to_string();
			let count = count_items(&request.chunks);

			if count == prev_count {
				if let Some(cached) = self.merger_cache.get(&pattern_string) {
					self.event_box
						.set(EventKind::SearchFin, Event::SearchFin(Arc::clone(cached)));
					continue;
				}
			} else {
				// The candidate set grew; every cached merger is stale.
				prev_count = count;
				self.merger_cache.clear();
			}

			if let Some(merger) = self.scan(&request, 0) {
				self.merger_cache
					.insert(pattern_string, Arc::clone(&merger));
				self.event_box
					.set(EventKind::SearchFin, Event::SearchFin(merger));
			}
		}
	}

	/// One-shot scan of `chunks` honoring the configured `limit`.
	///
	/// Returns `None` when the limit tripped, without leaking partial
	/// results — the building block for select-one / exit-on-empty hosts.
	#[must_use]
	pub fn find(&self, chunks: Vec<Arc<Chunk>>, query: &[char]) -> Option<Arc<Merger>> {
		let pattern = Pattern::build(query, &self.options);
		let request = MatchRequest { chunks, pattern };
		self.scan(&request, self.options.limit)
	}

	/// Partition the snapshot into contiguous slices, one per worker.
	fn slice_chunks<'a>(&self, chunks: &'a [Arc<Chunk>]) -> Vec<&'a [Arc<Chunk>]> {
		let partitions = self.partitions.min(chunks.len()).max(1);
		let per_slice = chunks.len() / partitions;
		let mut slices = Vec::with_capacity(partitions);
		for index in 0..partitions {
			let start = index * per_slice;
			let end = if index == partitions - 1 {
				chunks.len()
			} else {
				start + per_slice
			};
			slices.push(&chunks[start..end]);
		}
		slices
	}

	fn scan(&self, request: &MatchRequest, limit: usize) -> Option<Arc<Merger>> {
		let started_at = Instant::now();
		let num_chunks = request.chunks.len();
		if num_chunks == 0 {
			return Some(Merger::empty());
		}
		let empty = request.pattern.is_empty();
		let sort = self.options.sort && !empty;
		let cancelled = AtomicBool::new(false);
		let slices = self.slice_chunks(&request.chunks);
		let num_slices = slices.len();

		let (result_tx, result_rx) = mpsc::channel();
		// Bounded by the chunk count so worker sends never block, even after
		// the coordinator has bailed out.
		let (count_tx, count_rx) = mpsc::sync_channel(num_chunks);

		thread::scope(|scope| {
			for (slice_index, slice) in slices.iter().enumerate() {
				let chunks: &[Arc<Chunk>] = slice;
				let pattern = Arc::clone(&request.pattern);
				let result_tx = result_tx.clone();
				let count_tx = count_tx.clone();
				let cancelled = &cancelled;
				scope.spawn(move || {
					let mut matches = Vec::new();
					for chunk in chunks {
						let found: Vec<MatchedItem> = if empty {
							chunk
								.items()
								.iter()
								.cloned()
								.map(MatchedItem::unscored)
								.collect()
						} else {
							pattern.match_chunk(chunk)
						};
						let _ = count_tx.send(found.len());
						if cancelled.load(Ordering::Relaxed) {
							return;
						}
						matches.extend(found);
					}
					if sort {
						matches.sort_by(by_relevance);
					}
					let _ = result_tx.send((slice_index, matches));
				});
			}
			drop(result_tx);
			drop(count_tx);

			let mut scanned = 0;
			let mut match_count = 0;
			while scanned < num_chunks {
				let Ok(in_chunk) = count_rx.recv() else {
					unreachable!("matcher worker exited without reporting its chunk");
				};
				scanned += 1;
				match_count += in_chunk;

				if limit > 0 && match_count > limit {
					cancelled.store(true, Ordering::Relaxed);
					return None;
				}
				if !empty && self.req_box.peek(EventKind::ReqReset) {
					cancelled.store(true, Ordering::Relaxed);
					return None;
				}
				if started_at.elapsed() > PROGRESS_MIN_DURATION {
					self.event_box.set(
						EventKind::SearchProgress,
						Event::SearchProgress(scanned as f32 / num_chunks as f32),
					);
				}
			}

			let mut partial = vec![Vec::new(); num_slices];
			for _ in 0..num_slices {
				let Ok((slice_index, matches)) = result_rx.recv() else {
					unreachable!("matcher worker exited without publishing its slice");
				};
				partial[slice_index] = matches;
			}
			Some(Merger::new(partial, sort))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::item::Item;
	use crate::store::ChunkList;

	fn store_with(lines: usize) -> ChunkList {
		let store = ChunkList::new(Box::new(|index, line| Item::new(index, &line)));
		for i in 0..lines {
			store.push(format!("entry-{i}"));
		}
		store
	}

	fn matcher() -> Matcher {
		Matcher::new(SearchOptions::default(), Arc::new(EventBox::new()))
	}

	#[test]
	fn slices_cover_the_snapshot_contiguously() {
		let store = store_with(5 * crate::store::CHUNK_SIZE);
		let (chunks, _) = store.snapshot();
		let matcher = matcher();
		let slices = matcher.slice_chunks(&chunks);
		assert!(slices.len() <= chunks.len());
		let total: usize = slices.iter().map(|slice| slice.len()).sum();
		assert_eq!(total, chunks.len());
		assert!(slices.iter().all(|slice| !slice.is_empty()));
	}

	#[test]
	fn empty_snapshots_reuse_the_empty_merger() {
		let matcher = matcher();
		let merger = matcher.find(Vec::new(), &['x']).unwrap();
		assert!(Arc::ptr_eq(&merger, &Merger::empty()));
	}

	#[test]
	fn find_matches_across_chunk_boundaries() {
		let store = store_with(crate::store::CHUNK_SIZE + 10);
		let (chunks, count) = store.snapshot();
		let matcher = matcher();

		let query: Vec<char> = "entry-2".chars().collect();
		let merger = matcher.find(chunks.clone(), &query).unwrap();
		assert!(merger.len() > 0);
		assert!(merger.len() < count);

		let everything = matcher.find(chunks, &[]).unwrap();
		assert_eq!(everything.len(), count);
	}

	#[test]
	fn limit_aborts_without_a_merger() {
		let options = SearchOptions {
			limit: 10,
			..SearchOptions::default()
		};
		let matcher = Matcher::new(options, Arc::new(EventBox::new()));
		let store = store_with(1_000);
		let (chunks, _) = store.snapshot();
		assert!(matcher.find(chunks, &[]).is_none());
	}
}
