//! Append-only chunked candidate store.

use std::sync::{Arc, Mutex};

use crate::item::Item;

/// Maximum number of items a single chunk holds.
pub const CHUNK_SIZE: usize = 2048;

/// An immutable ordered group of items, the unit of parallel scanning.
///
/// Chunks are only published through [`ChunkList::snapshot`]; once a chunk is
/// handed out its contents never change, so workers scan it without
/// synchronization.
#[derive(Debug)]
pub struct Chunk {
	items: Vec<Item>,
}

impl Chunk {
	fn publish(items: Vec<Item>) -> Arc<Self> {
		Arc::new(Self { items })
	}

	/// Number of items in the chunk.
	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether the chunk holds no items.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// The items in insertion order.
	#[must_use]
	pub fn items(&self) -> &[Item] {
		&self.items
	}
}

/// Total number of items across a chunk snapshot.
#[must_use]
pub fn count_items(chunks: &[Arc<Chunk>]) -> usize {
	chunks.iter().map(|chunk| chunk.len()).sum()
}

/// Builder invoked for every pushed line, under the store lock, with the
/// item's insertion index.
pub type ItemBuilder = Box<dyn Fn(usize, String) -> Item + Send + Sync>;

struct ChunkListState {
	sealed: Vec<Arc<Chunk>>,
	active: Vec<Item>,
	count: usize,
}

/// Ordered sequence of chunks filled by the reader and scanned by the
/// matcher. Only the newest chunk accepts appends; earlier chunks are
/// sealed and immutable.
pub struct ChunkList {
	state: Mutex<ChunkListState>,
	build: ItemBuilder,
}

impl ChunkList {
	/// Create an empty store that builds items with `build`.
	#[must_use]
	pub fn new(build: ItemBuilder) -> Self {
		Self {
			state: Mutex::new(ChunkListState {
				sealed: Vec::new(),
				active: Vec::with_capacity(CHUNK_SIZE),
				count: 0,
			}),
			build,
		}
	}

	/// Append one candidate line, sealing the active chunk when it fills.
	pub fn push(&self, line: String) {
		let mut state = self.state.lock().unwrap();
		let index = state.count;
		let item = (self.build)(index, line);
		state.active.push(item);
		state.count += 1;
		if state.active.len() == CHUNK_SIZE {
			let items = std::mem::replace(&mut state.active, Vec::with_capacity(CHUNK_SIZE));
			state.sealed.push(Chunk::publish(items));
		}
	}

	/// An immutable view of all chunks plus the item count it covers.
	///
	/// The unsealed tail is frozen into its own chunk, so the returned
	/// chunks never change even while the reader keeps pushing.
	#[must_use]
	pub fn snapshot(&self) -> (Vec<Arc<Chunk>>, usize) {
		let state = self.state.lock().unwrap();
		let mut chunks = state.sealed.clone();
		if !state.active.is_empty() {
			chunks.push(Chunk::publish(state.active.clone()));
		}
		(chunks, state.count)
	}

	/// Total number of items pushed so far.
	#[must_use]
	pub fn count(&self) -> usize {
		self.state.lock().unwrap().count
	}
}
