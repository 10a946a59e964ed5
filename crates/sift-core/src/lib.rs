//! Core search engine for a streaming terminal fuzzy finder.
//!
//! A reader thread appends candidate lines to an append-only, chunked
//! [`ChunkList`]; a long-lived [`Matcher`] evaluates a compiled [`Pattern`]
//! over chunk snapshots in parallel, ranks matches, and publishes a
//! [`Merger`] — a lazily merged, index-addressable view over per-worker
//! results — on a coalescing [`EventBox`]. Every keystroke becomes a reset
//! request that supersedes in-flight work.
//!
//! ```
//! use std::sync::Arc;
//!
//! use sift_core::{ChunkList, EventBox, Item, Matcher, SearchOptions};
//!
//! let store = ChunkList::new(Box::new(|index, line| Item::new(index, &line)));
//! store.push("src/main.rs".to_string());
//! store.push("README.md".to_string());
//!
//! let matcher = Matcher::new(SearchOptions::default(), Arc::new(EventBox::new()));
//! let (chunks, _) = store.snapshot();
//! let query: Vec<char> = "main".chars().collect();
//! let merger = matcher.find(chunks, &query).unwrap();
//! assert_eq!(merger.len(), 1);
//! assert_eq!(merger.get(0).item.output(), "src/main.rs");
//! ```

pub mod event;
pub mod item;
pub mod matcher;
pub mod merger;
pub mod options;
pub mod pattern;
pub mod reader;
pub mod score;
pub mod store;

pub use event::{Event, EventBox, EventKind, Events};
pub use item::{FieldRange, FieldRangeError, Item};
pub use matcher::{MatchRequest, MatchRequester, Matcher};
pub use merger::{MatchedItem, Merger, by_relevance};
pub use options::{CaseMode, SearchOptions};
pub use pattern::{ItemMatch, Pattern, Term, TermMode};
pub use reader::Reader;
pub use score::{MatchSpan, Scored};
pub use store::{CHUNK_SIZE, Chunk, ChunkList, ItemBuilder, count_items};
