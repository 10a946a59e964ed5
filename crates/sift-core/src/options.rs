//! Engine configuration knobs.

/// Case sensitivity handling for query evaluation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CaseMode {
	/// Case-insensitive unless the query contains an uppercase character.
	#[default]
	Smart,
	/// Always compare exactly as typed.
	Sensitive,
	/// Always fold case before comparing.
	Insensitive,
}

/// Knobs the host program uses to configure the search engine.
#[derive(Clone, Debug)]
pub struct SearchOptions {
	/// Rank matches by relevance; when false the merger preserves insertion
	/// order and workers skip sorting.
	pub sort: bool,
	/// Split the query on whitespace into terms with modes and polarity.
	/// When false the whole query is a single fuzzy term.
	pub extended: bool,
	/// How query case is interpreted.
	pub case_mode: CaseMode,
	/// Abort a one-shot scan once total matches exceed this value
	/// (0 disables the limit).
	pub limit: usize,
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self {
			sort: true,
			extended: true,
			case_mode: CaseMode::Smart,
			limit: 0,
		}
	}
}
