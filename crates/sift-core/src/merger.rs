//! Ranked result views over parallel partial results.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, OnceLock};

use crate::item::Item;
use crate::score::MatchSpan;

/// A matched candidate together with the inputs of its relevance rank.
#[derive(Clone, Debug)]
pub struct MatchedItem {
	pub item: Item,
	pub score: i32,
	/// One interval per matched include term.
	pub spans: Vec<MatchSpan>,
}

impl MatchedItem {
	/// Wrap an item that matched an empty pattern.
	#[must_use]
	pub fn unscored(item: Item) -> Self {
		Self {
			item,
			score: 0,
			spans: Vec::new(),
		}
	}
}

/// Total relevance order: score descending, then shorter text, then
/// insertion order. The insertion-order tail makes ties deterministic
/// independent of partitioning.
#[must_use]
pub fn by_relevance(a: &MatchedItem, b: &MatchedItem) -> Ordering {
	b.score
		.cmp(&a.score)
		.then_with(|| a.item.text().len().cmp(&b.item.text().len()))
		.then_with(|| a.item.index().cmp(&b.item.index()))
}

#[derive(Debug)]
struct MergeState {
	merged: Vec<MatchedItem>,
	cursors: Vec<usize>,
}

/// Union view over per-partition result slices.
///
/// When ranking is active each slice is already sorted by its worker and
/// `get` lazily advances a k-way merge, caching every produced element so
/// repeated access is O(1). When ranking is off `get` walks the slices in
/// concatenation order, which equals insertion order.
#[derive(Debug)]
pub struct Merger {
	lists: Vec<Vec<MatchedItem>>,
	sorted: bool,
	count: usize,
	state: Mutex<MergeState>,
}

impl Merger {
	/// Build a merger over per-partition slices.
	#[must_use]
	pub fn new(lists: Vec<Vec<MatchedItem>>, sorted: bool) -> Arc<Self> {
		let count = lists.iter().map(Vec::len).sum();
		let cursors = vec![0; lists.len()];
		Arc::new(Self {
			lists,
			sorted,
			count,
			state: Mutex::new(MergeState {
				merged: Vec::new(),
				cursors,
			}),
		})
	}

	/// The shared merger with no partitions.
	#[must_use]
	pub fn empty() -> Arc<Self> {
		static EMPTY: OnceLock<Arc<Merger>> = OnceLock::new();
		Arc::clone(EMPTY.get_or_init(|| Merger::new(Vec::new(), false)))
	}

	/// Total number of matched items across all partitions.
	#[must_use]
	pub fn len(&self) -> usize {
		self.count
	}

	/// Whether the merger holds no matches.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// The `index`-th item in global rank order (or concatenation order when
	/// ranking is off).
	///
	/// # Panics
	///
	/// Panics when `index` is out of bounds; the caller is expected to stay
	/// within `len()`.
	#[must_use]
	pub fn get(&self, index: usize) -> MatchedItem {
		assert!(index < self.count, "merger index {index} out of bounds");
		if !self.sorted {
			let mut remaining = index;
			for list in &self.lists {
				if remaining < list.len() {
					return list[remaining].clone();
				}
				remaining -= list.len();
			}
			unreachable!("merger count exceeds its partitions");
		}

		let mut state = self.state.lock().unwrap();
		while state.merged.len() <= index {
			let mut winner: Option<usize> = None;
			for (list_index, list) in self.lists.iter().enumerate() {
				let cursor = state.cursors[list_index];
				if cursor >= list.len() {
					continue;
				}
				winner = match winner {
					None => Some(list_index),
					Some(held)
						if by_relevance(&list[cursor], &self.lists[held][state.cursors[held]])
							== Ordering::Less =>
					{
						Some(list_index)
					}
					Some(held) => Some(held),
				};
			}
			let Some(winner) = winner else {
				unreachable!("merger cursors exhausted before count");
			};
			let cursor = state.cursors[winner];
			state.cursors[winner] += 1;
			let next = self.lists[winner][cursor].clone();
			state.merged.push(next);
		}
		state.merged[index].clone()
	}
}
