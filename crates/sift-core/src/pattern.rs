//! Query compilation and per-item evaluation.

use std::sync::Arc;

use crate::item::Item;
use crate::merger::MatchedItem;
use crate::options::{CaseMode, SearchOptions};
use crate::score::{self, MatchSpan, Scored};
use crate::store::Chunk;

/// How a single term is matched against candidate text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TermMode {
	/// Subsequence match scored by alignment.
	Fuzzy,
	/// Substring starting at a word boundary (`'term`).
	ExactBoundary,
	/// Anchored at the start of the text (`^term`).
	ExactPrefix,
	/// Anchored at the end of the text (`term$`).
	ExactSuffix,
	/// The whole text (`^term$`).
	ExactEqual,
}

/// One component of an extended query.
#[derive(Clone, Debug)]
pub struct Term {
	pub mode: TermMode,
	/// An exclude term disqualifies any candidate it matches.
	pub exclude: bool,
	pub text: Vec<char>,
}

/// Result of evaluating a pattern against one item.
#[derive(Clone, Debug)]
pub struct ItemMatch {
	pub score: i32,
	/// One interval per matched include term.
	pub spans: Vec<MatchSpan>,
}

/// A compiled query: an ordered set of terms plus global case handling.
///
/// Patterns are immutable once built and cheap to share; the matcher keys
/// its merger cache on [`as_string`](Self::as_string).
#[derive(Clone, Debug)]
pub struct Pattern {
	terms: Vec<Term>,
	case_sensitive: bool,
	raw: String,
}

impl Pattern {
	/// Compile a raw query. Any sequence of Unicode scalars is valid;
	/// stray mode markers degrade to literal text or drop empty terms.
	#[must_use]
	pub fn build(runes: &[char], options: &SearchOptions) -> Arc<Self> {
		let raw: String = runes.iter().collect::<String>().trim().to_string();
		let case_sensitive = match options.case_mode {
			CaseMode::Sensitive => true,
			CaseMode::Insensitive => false,
			CaseMode::Smart => raw.chars().any(char::is_uppercase),
		};
		let terms = if options.extended {
			parse_terms(&raw)
		} else if raw.is_empty() {
			Vec::new()
		} else {
			vec![Term {
				mode: TermMode::Fuzzy,
				exclude: false,
				text: raw.chars().collect(),
			}]
		};
		Arc::new(Self {
			terms,
			case_sensitive,
			raw,
		})
	}

	/// Whether the pattern matches everything (no terms survived parsing).
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	/// The normalized query string, used as the merger-cache key.
	#[must_use]
	pub fn as_string(&self) -> &str {
		&self.raw
	}

	/// The compiled terms in query order.
	#[must_use]
	pub fn terms(&self) -> &[Term] {
		&self.terms
	}

	/// Evaluate the pattern against one item. Every include term must
	/// match; any matching exclude term disqualifies the item.
	#[must_use]
	pub fn match_item(&self, item: &Item) -> Option<ItemMatch> {
		let mut score = 0;
		let mut spans = Vec::new();
		for term in &self.terms {
			match (self.match_term(term, item.text()), term.exclude) {
				(Some(_), true) => return None,
				(None, true) => {}
				(Some(scored), false) => {
					score += scored.score;
					spans.push(scored.span);
				}
				(None, false) => return None,
			}
		}
		Some(ItemMatch { score, spans })
	}

	/// Collect the chunk's matching items in insertion order.
	#[must_use]
	pub fn match_chunk(&self, chunk: &Chunk) -> Vec<MatchedItem> {
		let mut matches = Vec::new();
		for item in chunk.items() {
			if let Some(found) = self.match_item(item) {
				matches.push(MatchedItem {
					item: item.clone(),
					score: found.score,
					spans: found.spans,
				});
			}
		}
		matches
	}

	fn match_term(&self, term: &Term, text: &[char]) -> Option<Scored> {
		let case = self.case_sensitive;
		match term.mode {
			TermMode::Fuzzy => score::fuzzy_match(text, &term.text, case),
			TermMode::ExactBoundary => score::boundary_match(text, &term.text, case),
			TermMode::ExactPrefix => score::prefix_match(text, &term.text, case),
			TermMode::ExactSuffix => score::suffix_match(text, &term.text, case),
			TermMode::ExactEqual => score::equal_match(text, &term.text, case),
		}
	}
}

/// Split an extended query on whitespace and classify each token.
fn parse_terms(raw: &str) -> Vec<Term> {
	let mut terms = Vec::new();
	for token in raw.split_whitespace() {
		let mut text = token;
		let mut exclude = false;
		let mut mode = TermMode::Fuzzy;

		if let Some(rest) = text.strip_prefix('!') {
			exclude = true;
			text = rest;
		}
		if let Some(rest) = text.strip_prefix('\'') {
			mode = TermMode::ExactBoundary;
			text = rest;
		} else {
			let mut prefix = false;
			let mut suffix = false;
			if let Some(rest) = text.strip_prefix('^') {
				prefix = true;
				text = rest;
			}
			if let Some(rest) = text.strip_suffix('$') {
				suffix = true;
				text = rest;
			}
			mode = match (prefix, suffix) {
				(true, true) => TermMode::ExactEqual,
				(true, false) => TermMode::ExactPrefix,
				(false, true) => TermMode::ExactSuffix,
				(false, false) => mode,
			};
		}

		if text.is_empty() {
			continue;
		}
		terms.push(Term {
			mode,
			exclude,
			text: text.chars().collect(),
		});
	}
	terms
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build(query: &str, options: &SearchOptions) -> Arc<Pattern> {
		let runes: Vec<char> = query.chars().collect();
		Pattern::build(&runes, options)
	}

	fn matches(pattern: &Pattern, line: &str) -> bool {
		pattern.match_item(&Item::new(0, line)).is_some()
	}

	#[test]
	fn classifies_extended_tokens() {
		let pattern = build("'quoted ^head tail$ ^whole$ !not plain", &SearchOptions::default());
		let modes: Vec<(TermMode, bool)> = pattern
			.terms()
			.iter()
			.map(|term| (term.mode, term.exclude))
			.collect();
		assert_eq!(
			modes,
			[
				(TermMode::ExactBoundary, false),
				(TermMode::ExactPrefix, false),
				(TermMode::ExactSuffix, false),
				(TermMode::ExactEqual, false),
				(TermMode::Fuzzy, true),
				(TermMode::Fuzzy, false),
			]
		);
	}

	#[test]
	fn non_extended_queries_are_one_fuzzy_term() {
		let options = SearchOptions {
			extended: false,
			..SearchOptions::default()
		};
		let pattern = build("^head tail$", &options);
		assert_eq!(pattern.terms().len(), 1);
		assert_eq!(pattern.terms()[0].mode, TermMode::Fuzzy);
		let text: String = pattern.terms()[0].text.iter().collect();
		assert_eq!(text, "^head tail$");
	}

	#[test]
	fn marker_only_tokens_are_dropped() {
		let pattern = build("! ' ^ $ ^$", &SearchOptions::default());
		assert!(pattern.is_empty());
		assert!(matches(&pattern, "anything"));
	}

	#[test]
	fn empty_patterns_match_everything_with_score_zero() {
		let pattern = build("", &SearchOptions::default());
		assert!(pattern.is_empty());
		let found = pattern.match_item(&Item::new(0, "whatever")).unwrap();
		assert_eq!(found.score, 0);
		assert!(found.spans.is_empty());
	}

	#[test]
	fn smart_case_follows_query_casing() {
		let options = SearchOptions::default();
		let lower = build("foo", &options);
		assert!(matches(&lower, "foo"));
		assert!(matches(&lower, "Foo"));
		assert!(matches(&lower, "FOO"));

		let mixed = build("Foo", &options);
		assert!(matches(&mixed, "Foo"));
		assert!(!matches(&mixed, "FOO"));
		assert!(!matches(&mixed, "foo"));
	}

	#[test]
	fn case_mode_overrides_smart_case() {
		let insensitive = SearchOptions {
			case_mode: CaseMode::Insensitive,
			..SearchOptions::default()
		};
		assert!(matches(&build("Foo", &insensitive), "fOO"));

		let sensitive = SearchOptions {
			case_mode: CaseMode::Sensitive,
			..SearchOptions::default()
		};
		assert!(!matches(&build("foo", &sensitive), "FOO"));
	}

	#[test]
	fn exclude_terms_disqualify_regardless_of_other_matches() {
		let pattern = build("err !warn", &SearchOptions::default());
		assert!(matches(&pattern, "error"));
		assert!(!matches(&pattern, "error warn"));
	}

	#[test]
	fn exclude_only_patterns_pass_everything_else() {
		let pattern = build("!error", &SearchOptions::default());
		assert!(!pattern.is_empty());
		assert!(!matches(&pattern, "error"));
		assert!(matches(&pattern, "warn"));
		assert!(matches(&pattern, "info"));
	}

	#[test]
	fn boundary_terms_need_a_word_boundary() {
		let pattern = build("'bar", &SearchOptions::default());
		assert!(matches(&pattern, "foo-bar"));
		assert!(matches(&pattern, "bar"));
		assert!(!matches(&pattern, "foobar"));
	}

	#[test]
	fn include_term_scores_accumulate() {
		let pattern = build("^src .c$", &SearchOptions::default());
		let found = pattern.match_item(&Item::new(0, "src/main.c")).unwrap();
		assert_eq!(found.spans.len(), 2);
		assert_eq!(found.spans[0], MatchSpan { start: 0, end: 3 });
		assert_eq!(found.spans[1], MatchSpan { start: 8, end: 10 });
		assert!(found.score > 0);
	}

	#[test]
	fn interior_markers_stay_literal() {
		let pattern = build("a$b", &SearchOptions::default());
		assert_eq!(pattern.terms()[0].mode, TermMode::Fuzzy);
		assert!(matches(&pattern, "xa$by"));
		assert!(!matches(&pattern, "ab"));
	}
}
